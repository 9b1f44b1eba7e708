//! 驱动层错误类型定义

use rover_link::LinkError;
use rover_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 链路错误（只有不可重试的错误会传到这里）
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 课程文件读取失败
    #[error("Failed to read course file: {0}")]
    Io(#[from] std::io::Error),

    /// 课程行格式错误（致命，循环启动前中止）
    #[error("Malformed course line {line}: {reason}")]
    MalformedCourseLine { line: usize, reason: String },

    /// 侧向比值的分母（侧后方净空）为 0
    #[error("Division by zero: side-back clearance is 0")]
    DivisionByZero,

    /// 尚未收到任何传感器数据
    #[error("No sensor data received yet")]
    NoSensorData,
}
