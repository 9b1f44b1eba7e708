//! 导航引擎（自主模式）
//!
//! 根据最近一次传感器数据决定下一条运动指令。内部状态机：
//!
//! ```text
//! Stopped ──任意──> Forward
//! Forward ──侧向全部畅通 && little_more──> OnCorner      (右转 90°)
//! Forward ──侧向全部畅通 && !little_more──> Forward      (前进 45 cm)
//! Forward ──前方距离 <= 阈值──> AgainstObstacle          (左转 90°)
//! Forward ──其他──> Forward                              (保持上一条指令)
//! AgainstObstacle ──任意──> Forward                      (半速前进)
//! OnCorner ──侧向都贴墙──> Forward                       (半速前进)
//! OnCorner ──其他──> OnCorner                            (前进 45 cm)
//! ```
//!
//! 没有终止状态，自主模式一直运行到外部停止。

use crate::error::DriverError;
use crate::source::{DistanceTracker, MoveSource};
use rover_protocol::{
    DistanceFrame, FORWARD_45CM, Frame, HALF_FORWARD, SensorFrame, TURN_LEFT_90, TURN_RIGHT_90,
};
use tracing::trace;

/// 净空阈值（90）
pub const CLEARANCE_THRESHOLD: u8 = 0x5A;

/// 导航状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    #[default]
    Stopped,
    Forward,
    AgainstObstacle,
    OnCorner,
}

/// 一次状态转移的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// 新指令；`None` 表示保持上一条指令不变
    pub command: Option<Frame>,
    pub next: NavState,
    pub little_more: bool,
}

impl Transition {
    fn emit(command: Frame, next: NavState, little_more: bool) -> Self {
        Self {
            command: Some(command),
            next,
            little_more,
        }
    }

    fn hold(state: NavState, little_more: bool) -> Self {
        Self {
            command: None,
            next: state,
            little_more,
        }
    }
}

/// 状态转移函数（纯函数）
///
/// `Forward`/`OnCorner` 需要传感器数据；尚无数据时保持当前状态与指令。
pub fn transition(state: NavState, little_more: bool, sensor: Option<&SensorFrame>) -> Transition {
    match (state, sensor) {
        (NavState::Stopped, _) => Transition::emit(HALF_FORWARD, NavState::Forward, little_more),

        (NavState::AgainstObstacle, _) => {
            Transition::emit(HALF_FORWARD, NavState::Forward, little_more)
        },

        (NavState::Forward, Some(s)) => {
            if s.side_front() >= CLEARANCE_THRESHOLD && s.side_back() >= CLEARANCE_THRESHOLD {
                if little_more {
                    Transition::emit(TURN_RIGHT_90, NavState::OnCorner, false)
                } else {
                    Transition::emit(FORWARD_45CM, NavState::Forward, true)
                }
            } else if s.front() <= CLEARANCE_THRESHOLD {
                Transition::emit(TURN_LEFT_90, NavState::AgainstObstacle, little_more)
            } else {
                // 没有条件命中：保持上一条指令
                Transition::hold(NavState::Forward, little_more)
            }
        },

        (NavState::OnCorner, Some(s)) => {
            if s.side_front() <= CLEARANCE_THRESHOLD && s.side_back() <= CLEARANCE_THRESHOLD {
                Transition::emit(HALF_FORWARD, NavState::Forward, little_more)
            } else {
                Transition::emit(FORWARD_45CM, NavState::OnCorner, little_more)
            }
        },

        (state, None) => Transition::hold(state, little_more),
    }
}

/// 导航引擎
#[derive(Debug, Clone)]
pub struct NavigationEngine {
    state: NavState,
    little_more: bool,
    sensor: Option<SensorFrame>,
    /// 当前持有的指令；初始为半速前进，`Stopped` 的第一次转移也会写入它
    command: Frame,
    distance: DistanceTracker,
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationEngine {
    pub fn new() -> Self {
        Self {
            state: NavState::Stopped,
            little_more: false,
            sensor: None,
            command: HALF_FORWARD,
            distance: DistanceTracker::new(),
        }
    }

    /// 保存最新传感器数据
    pub fn receive_sensor_frame(&mut self, frame: SensorFrame) {
        self.sensor = Some(frame);
    }

    /// 计算下一条运动指令并推进状态
    pub fn next_move(&mut self) -> Frame {
        let t = transition(self.state, self.little_more, self.sensor.as_ref());
        if let Some(command) = t.command {
            self.command = command;
        }
        trace!(
            "Navigation {:?} -> {:?} (little_more={}) command {}",
            self.state, t.next, t.little_more, self.command
        );
        self.state = t.next;
        self.little_more = t.little_more;
        self.command
    }

    /// 回报距离应答，返回运动是否完成；完成时距离跟踪清零
    pub fn report_move_outcome(&mut self, response: &DistanceFrame) -> bool {
        self.distance.update(response)
    }

    /// 侧向比值 `side_front / side_back`（诊断用）
    pub fn side_delta(&self) -> Result<f64, DriverError> {
        let sensor = self.sensor.as_ref().ok_or(DriverError::NoSensorData)?;
        if sensor.side_back() == 0 {
            return Err(DriverError::DivisionByZero);
        }
        Ok(f64::from(sensor.side_front()) / f64::from(sensor.side_back()))
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// 转角处是否已经补过一次前进
    pub fn little_more(&self) -> bool {
        self.little_more
    }

    pub fn held_command(&self) -> Frame {
        self.command
    }

    pub fn last_sensor_frame(&self) -> Option<&SensorFrame> {
        self.sensor.as_ref()
    }

    pub fn distance(&self) -> &DistanceTracker {
        &self.distance
    }
}

impl MoveSource for NavigationEngine {
    fn receive_sensor_frame(&mut self, frame: SensorFrame) {
        NavigationEngine::receive_sensor_frame(self, frame);
    }

    fn next_move(&mut self) -> Option<Frame> {
        Some(NavigationEngine::next_move(self))
    }

    fn report_move_outcome(&mut self, response: &DistanceFrame) -> bool {
        NavigationEngine::report_move_outcome(self, response)
    }
}
