//! 控制循环
//!
//! 三状态请求/应答循环：
//!
//! ```text
//! AwaitSensors ──0x01──> AwaitMoveAck ──0x03──> AwaitDistance ──0x04 且已停止──> AwaitSensors
//!      ↺ 超时/短帧/错误操作码      ↺ 重发同一条指令          ↺ 未停止/超时/错误操作码
//! ```
//!
//! 应答缺失、不完整或操作码不符时在当前状态原地重试，没有重试上限，
//! 也没有退避。只有不可重试的链路错误会结束循环。

use crate::error::DriverError;
use crate::metrics::LoopMetrics;
use crate::mode::{OperatingMode, SensorMode};
use crate::source::MoveSource;
use rover_link::{LinkError, RoverLink};
use rover_protocol::{
    DISTANCE_REQUEST, DistanceFrame, Frame, MoveAck, Opcode, ProtocolError, SENSOR_REQUEST,
    SensorFrame,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 控制状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    /// 发送传感器请求，等待 0x01
    #[default]
    AwaitSensors,
    /// 发送运动指令，等待 0x03
    AwaitMoveAck,
    /// 发送距离请求，等待 0x04 且停止标志置位
    AwaitDistance,
}

/// 循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// 课程全部完成
    CourseComplete,
    /// 运行标志被外部清除
    Stopped,
}

/// 链路节拍
///
/// 这些延时只用来给物理链路留出余量，不影响正确性。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// 发出传感器请求后、读取应答前的等待
    pub sensor_settle: Duration,
    /// 每次写运动指令前的等待
    pub pre_move: Duration,
    /// 自主模式下向导航引擎索取新指令前的等待
    pub navigation_pacing: Duration,
    /// 仅传感器模式下两次采集之间的间隔
    pub sensors_only_interval: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            sensor_settle: Duration::from_millis(100),
            pre_move: Duration::from_millis(100),
            navigation_pacing: Duration::from_millis(200),
            sensors_only_interval: Duration::from_millis(500),
        }
    }
}

impl LoopTiming {
    /// 全部为零（测试用）
    pub fn immediate() -> Self {
        Self {
            sensor_settle: Duration::ZERO,
            pre_move: Duration::ZERO,
            navigation_pacing: Duration::ZERO,
            sensors_only_interval: Duration::ZERO,
        }
    }
}

fn request_label(frame: &Frame) -> &'static str {
    match Opcode::from_byte(frame.opcode()) {
        Ok(Opcode::SensorRequest) => "Sensor gather request",
        Ok(Opcode::DistanceRequest) => "Distance request     ",
        Ok(op) if op.is_movement() => "Movement command     ",
        _ => "Unknown request      ",
    }
}

fn pace(delay: Duration) {
    if !delay.is_zero() {
        spin_sleep::sleep(delay);
    }
}

/// 控制循环
///
/// 独占链路与运动指令来源；所有可变状态都是它的字段，没有全局变量。
///
/// # Example
///
/// ```no_run
/// use rover_driver::{ControlLoop, Course, LoopOutcome, OperatingMode};
/// use rover_link::{SerialConfig, SerialLink};
///
/// let course = Course::load("course.txt")?;
/// let link = SerialLink::open(&SerialConfig::new("/dev/ttyUSB0"))?;
/// let mut control = ControlLoop::new(link, course, OperatingMode::default());
/// assert_eq!(control.run()?, LoopOutcome::CourseComplete);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ControlLoop<L: RoverLink, S: MoveSource> {
    link: L,
    source: S,
    mode: OperatingMode,
    timing: LoopTiming,
    state: ControlState,
    /// 已取得但尚未被确认的运动指令，重试时原样重发
    pending_move: Option<Frame>,
    metrics: Arc<LoopMetrics>,
    running: Option<Arc<AtomicBool>>,
}

impl<L: RoverLink, S: MoveSource> ControlLoop<L, S> {
    pub fn new(link: L, source: S, mode: OperatingMode) -> Self {
        Self {
            link,
            source,
            mode,
            timing: LoopTiming::default(),
            state: ControlState::AwaitSensors,
            pending_move: None,
            metrics: Arc::new(LoopMetrics::new()),
            running: None,
        }
    }

    /// 设置链路节拍
    pub fn with_timing(mut self, timing: LoopTiming) -> Self {
        self.timing = timing;
        self
    }

    /// 共享运行标志；被置为 `false` 后循环在下一步之前退出
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    /// 使用外部指标实例
    pub fn with_metrics(mut self, metrics: Arc<LoopMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// 运行直到课程完成或被外部停止
    ///
    /// 自主模式下只会因外部停止或致命链路错误返回。
    pub fn run(&mut self) -> Result<LoopOutcome, DriverError> {
        info!("Control loop started ({:?})", self.mode);
        loop {
            if self.source.is_finished() {
                info!("End of course");
                return Ok(LoopOutcome::CourseComplete);
            }
            if self.stop_requested() {
                info!("Control loop stopped in {:?}", self.state);
                return Ok(LoopOutcome::Stopped);
            }
            self.step()?;
        }
    }

    /// 执行一次状态转移，返回新状态
    pub fn step(&mut self) -> Result<ControlState, DriverError> {
        let next = match self.state {
            ControlState::AwaitSensors => self.await_sensors()?,
            ControlState::AwaitMoveAck => self.await_move_ack()?,
            ControlState::AwaitDistance => self.await_distance()?,
        };
        if next != self.state {
            trace!("{:?} -> {:?}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    fn await_sensors(&mut self) -> Result<ControlState, DriverError> {
        if self.mode.sensors == SensorMode::Skip {
            return Ok(ControlState::AwaitMoveAck);
        }

        self.send(&SENSOR_REQUEST)?;
        pace(self.timing.sensor_settle);

        let Some(reply) = self.receive()? else {
            return Ok(ControlState::AwaitSensors);
        };
        debug!("Received: Sensor data frame     {}", reply);

        match SensorFrame::try_from(reply) {
            Ok(sensor) => {
                LoopMetrics::incr(&self.metrics.sensor_frames);
                info!(
                    "FRONT: {} SIDE_FRONT: {} SIDE_BACK: {}",
                    sensor.front(),
                    sensor.side_front(),
                    sensor.side_back()
                );
                self.source.receive_sensor_frame(sensor);

                if self.mode.sensors == SensorMode::Only {
                    pace(self.timing.sensors_only_interval);
                    Ok(ControlState::AwaitSensors)
                } else {
                    Ok(ControlState::AwaitMoveAck)
                }
            },
            Err(e) => {
                self.reject(e);
                Ok(ControlState::AwaitSensors)
            },
        }
    }

    fn await_move_ack(&mut self) -> Result<ControlState, DriverError> {
        let command = match self.pending_move {
            Some(command) => command,
            None => {
                if self.mode.is_autonomous() {
                    pace(self.timing.navigation_pacing);
                }
                let Some(command) = self.source.next_move() else {
                    // 来源已耗尽，交给 run() 结束循环
                    return Ok(ControlState::AwaitSensors);
                };
                self.pending_move = Some(command);
                command
            },
        };

        pace(self.timing.pre_move);
        self.send(&command)?;

        let Some(reply) = self.receive()? else {
            return Ok(ControlState::AwaitMoveAck);
        };

        match MoveAck::try_from(reply) {
            Ok(_) => {
                debug!("Received: Command Acknowledged  {}", reply);
                self.pending_move = None;
                Ok(ControlState::AwaitDistance)
            },
            Err(e) => {
                self.reject(e);
                Ok(ControlState::AwaitMoveAck)
            },
        }
    }

    fn await_distance(&mut self) -> Result<ControlState, DriverError> {
        self.send(&DISTANCE_REQUEST)?;

        let Some(reply) = self.receive()? else {
            return Ok(ControlState::AwaitDistance);
        };

        match DistanceFrame::try_from(reply) {
            Ok(distance) => {
                debug!("Received: Movement data         {}", reply);
                if self.source.report_move_outcome(&distance) {
                    LoopMetrics::incr(&self.metrics.moves_completed);
                    Ok(ControlState::AwaitSensors)
                } else {
                    Ok(ControlState::AwaitDistance)
                }
            },
            Err(e) => {
                self.reject(e);
                Ok(ControlState::AwaitDistance)
            },
        }
    }

    /// 写出请求；先丢弃上一次迟到应答留在输入缓冲里的字节
    fn send(&mut self, frame: &Frame) -> Result<(), DriverError> {
        self.link.clear_input()?;
        self.link.send(frame)?;
        LoopMetrics::incr(&self.metrics.frames_sent);
        debug!("Sent:     {} {}", request_label(frame), frame);
        Ok(())
    }

    /// 读取应答；可重试的链路错误返回 `Ok(None)`
    fn receive(&mut self) -> Result<Option<Frame>, DriverError> {
        match self.link.receive() {
            Ok(frame) => {
                LoopMetrics::incr(&self.metrics.frames_received);
                Ok(Some(frame))
            },
            Err(e) if e.is_retryable() => {
                match e {
                    LinkError::ShortRead { .. } => LoopMetrics::incr(&self.metrics.short_reads),
                    _ => LoopMetrics::incr(&self.metrics.timeouts),
                }
                debug!("{} in {:?}, retrying", e, self.state);
                Ok(None)
            },
            Err(e) => Err(e.into()),
        }
    }

    fn reject(&self, error: ProtocolError) {
        LoopMetrics::incr(&self.metrics.unexpected_opcodes);
        warn!("{} in {:?}, retrying", error, self.state);
    }

    fn stop_requested(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.load(Ordering::Acquire))
    }

    /// 当前控制状态
    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// 等待确认的运动指令
    pub fn pending_move(&self) -> Option<Frame> {
        self.pending_move
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn metrics(&self) -> &Arc<LoopMetrics> {
        &self.metrics
    }

    /// 拆出链路与来源
    pub fn into_parts(self) -> (L, S) {
        (self.link, self.source)
    }
}
