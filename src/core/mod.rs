//! 核心会话模块 - 翻译会话与统计

pub mod session;

pub use session::{SessionStats, SessionStatsSnapshot, TranslationSession};
