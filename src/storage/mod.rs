//! 存储管理模块 - 翻译结果缓存

pub mod cache;

pub use cache::{CacheStats, CacheStatsSnapshot, TranslationCache};
