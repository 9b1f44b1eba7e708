//! # Rover Driver
//!
//! 小车驱动层：
//! - 课程加载（脚本模式的运动指令序列）
//! - 导航引擎（自主模式的状态机）
//! - 三状态请求/应答控制循环
//!
//! 单线程、完全同步、阻塞 IO。控制循环独占链路与运动指令来源。

pub mod control;
pub mod course;
mod error;
pub mod metrics;
pub mod mode;
pub mod navigation;
pub mod source;

pub use control::{ControlLoop, ControlState, LoopOutcome, LoopTiming};
pub use course::Course;
pub use error::DriverError;
pub use metrics::{LoopMetrics, MetricsSnapshot};
pub use mode::{OperatingMode, SensorMode, SourceKind};
pub use navigation::{CLEARANCE_THRESHOLD, NavState, NavigationEngine, Transition, transition};
pub use source::{DistanceTracker, MoveSource};
