//! 控制循环指标
//!
//! 原子计数器，用于观察链路健康状况（超时、短帧、错误操作码的重试次数）。
//! 计数只做观察，不参与重试决策。

use std::sync::atomic::{AtomicU64, Ordering};

/// 控制循环实时指标
///
/// ```rust
/// use rover_driver::LoopMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = LoopMetrics::default();
/// metrics.frames_sent.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().frames_sent, 1);
/// ```
#[derive(Debug, Default)]
pub struct LoopMetrics {
    /// 发出的帧数
    pub frames_sent: AtomicU64,

    /// 收到的完整帧数
    pub frames_received: AtomicU64,

    /// 读取超时次数
    pub timeouts: AtomicU64,

    /// 不完整应答次数
    pub short_reads: AtomicU64,

    /// 操作码不符的应答次数
    pub unexpected_opcodes: AtomicU64,

    /// 有效传感器帧数
    pub sensor_frames: AtomicU64,

    /// 完成的运动数
    pub moves_completed: AtomicU64,
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            unexpected_opcodes: self.unexpected_opcodes.load(Ordering::Relaxed),
            sensor_frames: self.sensor_frames.load(Ordering::Relaxed),
            moves_completed: self.moves_completed.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.frames_sent.store(0, Ordering::Relaxed);
        self.frames_received.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.short_reads.store(0, Ordering::Relaxed);
        self.unexpected_opcodes.store(0, Ordering::Relaxed);
        self.sensor_frames.store(0, Ordering::Relaxed);
        self.moves_completed.store(0, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub timeouts: u64,
    pub short_reads: u64,
    pub unexpected_opcodes: u64,
    pub sensor_frames: u64,
    pub moves_completed: u64,
}

impl MetricsSnapshot {
    /// 需要重试的交互总数
    pub fn retries(&self) -> u64 {
        self.timeouts + self.short_reads + self.unexpected_opcodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = LoopMetrics::new();
        LoopMetrics::incr(&metrics.timeouts);
        LoopMetrics::incr(&metrics.short_reads);
        LoopMetrics::incr(&metrics.unexpected_opcodes);
        LoopMetrics::incr(&metrics.moves_completed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.retries(), 3);
        assert_eq!(snapshot.moves_completed, 1);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
