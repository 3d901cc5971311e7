//! 流式聚合模块
//!
//! 单发任务的转换契约可能以增量形式吐出文本。聚合器把增量累积进
//! 运行缓冲区，并以固定的最小间隔节流对外可见的更新，约束渲染压力。
//! 任务结束时的最终完整缓冲区必须无条件发布，不受节流窗口限制——
//! 这由调度器在收到任务完成事件时保证，聚合器只负责中间态的节流。

use std::time::{Duration, Instant};

/// 增量文本聚合器
#[derive(Debug)]
pub struct StreamAggregator {
    buffer: String,
    min_interval: Duration,
    last_publish: Option<Instant>,
}

impl StreamAggregator {
    /// 以指定的最小发布间隔创建聚合器
    pub fn new(min_interval: Duration) -> Self {
        Self {
            buffer: String::new(),
            min_interval,
            last_publish: None,
        }
    }

    /// 追加一个增量，返回当前是否应当发布可见更新
    ///
    /// 首个增量立即发布；之后只有距上次发布超过最小间隔才发布。
    pub fn push(&mut self, delta: &str) -> bool {
        self.buffer.push_str(delta);
        let now = Instant::now();
        match self.last_publish {
            None => {
                self.last_publish = Some(now);
                true
            }
            Some(last) if now.duration_since(last) >= self.min_interval => {
                self.last_publish = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    /// 当前累积的缓冲区内容
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// 取出完整缓冲区（任务结束时使用）
    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_delta_publishes_immediately() {
        let mut agg = StreamAggregator::new(Duration::from_secs(60));
        assert!(agg.push("第一"));
        assert_eq!(agg.text(), "第一");
    }

    #[test]
    fn test_rapid_deltas_are_throttled() {
        let mut agg = StreamAggregator::new(Duration::from_secs(60));
        assert!(agg.push("a"));
        // 间隔远未到，后续增量只累积不发布
        assert!(!agg.push("b"));
        assert!(!agg.push("c"));
        assert_eq!(agg.text(), "abc");
    }

    #[test]
    fn test_zero_interval_always_publishes() {
        let mut agg = StreamAggregator::new(Duration::ZERO);
        assert!(agg.push("a"));
        assert!(agg.push("b"));
    }

    #[test]
    fn test_finish_yields_full_buffer() {
        let mut agg = StreamAggregator::new(Duration::from_secs(60));
        agg.push("hello ");
        agg.push("world");
        assert_eq!(agg.finish(), "hello world");
    }

    #[test]
    fn test_publish_resumes_after_interval() {
        let mut agg = StreamAggregator::new(Duration::from_millis(10));
        assert!(agg.push("a"));
        assert!(!agg.push("b"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(agg.push("c"));
    }
}
