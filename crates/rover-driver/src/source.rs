//! 运动指令来源
//!
//! 控制循环通过 `MoveSource` 向课程或导航引擎索取下一条运动指令，
//! 并回报每次距离应答。两种来源共用 `DistanceTracker` 记录行驶距离。

use rover_protocol::{DistanceFrame, Frame, SensorFrame};
use tracing::{debug, info};

/// 运动指令来源
pub trait MoveSource {
    /// 保存最新的传感器数据
    fn receive_sensor_frame(&mut self, frame: SensorFrame);

    /// 下一条运动指令；`None` 表示来源已耗尽
    fn next_move(&mut self) -> Option<Frame>;

    /// 回报距离应答，返回本次运动是否完成
    fn report_move_outcome(&mut self, response: &DistanceFrame) -> bool;

    /// 来源是否已耗尽（循环应当结束）
    fn is_finished(&self) -> bool {
        false
    }
}

impl<S: MoveSource + ?Sized> MoveSource for Box<S> {
    fn receive_sensor_frame(&mut self, frame: SensorFrame) {
        (**self).receive_sensor_frame(frame)
    }

    fn next_move(&mut self) -> Option<Frame> {
        (**self).next_move()
    }

    fn report_move_outcome(&mut self, response: &DistanceFrame) -> bool {
        (**self).report_move_outcome(response)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// 行驶距离跟踪
///
/// 三个二维向量在运动完成时全部清零。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistanceTracker {
    current_total: [i32; 2],
    last_total: [i32; 2],
    last_delta: [i32; 2],
}

impl DistanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用一帧距离应答更新，返回运动是否完成
    pub fn update(&mut self, response: &DistanceFrame) -> bool {
        let travelled = response.travelled();
        self.current_total = [i32::from(travelled[0]), i32::from(travelled[1])];

        self.last_delta = [
            self.current_total[0] - self.last_total[0],
            self.current_total[1] - self.last_total[1],
        ];
        self.last_total = self.current_total;

        if response.is_stopped() {
            info!("Move complete, total distance {:?}", self.current_total);
            *self = Self::default();
            true
        } else {
            debug!("Delta distance {:?}", self.last_delta);
            false
        }
    }

    /// 当前累计距离
    pub fn current_total(&self) -> [i32; 2] {
        self.current_total
    }

    /// 上一次累计距离
    pub fn last_total(&self) -> [i32; 2] {
        self.last_total
    }

    /// 最近两次应答之间的距离增量
    pub fn last_delta(&self) -> [i32; 2] {
        self.last_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(stop: u8, a: u8, b: u8) -> DistanceFrame {
        DistanceFrame::try_from(Frame::new([0x04, stop, a, b, 0x00, 0x00])).unwrap()
    }

    #[test]
    fn test_tracker_accumulates_delta() {
        let mut tracker = DistanceTracker::new();
        assert!(!tracker.update(&distance(0x00, 10, 12)));
        assert_eq!(tracker.current_total(), [10, 12]);
        assert_eq!(tracker.last_delta(), [10, 12]);

        assert!(!tracker.update(&distance(0x00, 25, 20)));
        assert_eq!(tracker.current_total(), [25, 20]);
        assert_eq!(tracker.last_total(), [25, 20]);
        assert_eq!(tracker.last_delta(), [15, 8]);
    }

    #[test]
    fn test_tracker_delta_can_be_negative() {
        let mut tracker = DistanceTracker::new();
        tracker.update(&distance(0x00, 30, 30));
        tracker.update(&distance(0x00, 20, 35));
        assert_eq!(tracker.last_delta(), [-10, 5]);
    }

    #[test]
    fn test_tracker_resets_on_stop() {
        let mut tracker = DistanceTracker::new();
        tracker.update(&distance(0x00, 10, 10));
        assert!(tracker.update(&distance(0x01, 40, 41)));
        assert_eq!(tracker, DistanceTracker::default());
    }
}
