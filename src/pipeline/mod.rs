//! 翻译流水线模块
//!
//! - [`batch`]: 任务划分（批次/单发）与批次线格式
//! - [`scheduler`]: 有界并发的趟次驱动
//! - [`stream`]: 增量输出的节流聚合

pub mod batch;
pub mod scheduler;
pub mod stream;

pub use batch::{partition_jobs, Job, JobItem, JobKind, JobState};
pub use scheduler::{run_pass, PassHandle, PassOutcome};
pub use stream::StreamAggregator;
