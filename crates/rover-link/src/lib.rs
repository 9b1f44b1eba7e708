//! # Rover Link Layer
//!
//! 串口链路抽象层：半双工、请求/应答、固定 6 字节帧。
//!
//! - `RoverLink`：统一的收发接口，控制循环只依赖这个 trait
//! - `SerialLink`：基于 `serialport` 的真实串口后端（feature `serial`）
//! - `MockLink`：脚本化应答的测试后端（feature `mock`）

use thiserror::Error;

pub use rover_protocol::Frame;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialLink};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockLink;

/// 链路层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    /// 超时前未收到任何字节
    #[error("Read timeout")]
    Timeout,

    /// 超时前只收到部分帧
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("Link closed")]
    Closed,
}

impl LinkError {
    /// 应答缺失或不完整，可以在当前状态原地重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, LinkError::Timeout | LinkError::ShortRead { .. })
    }
}

/// 半双工帧链路
///
/// 每次交互都是一次阻塞写入加一次带超时的阻塞读取。
pub trait RoverLink {
    /// 写出一帧
    fn send(&mut self, frame: &Frame) -> Result<(), LinkError>;

    /// 读取一帧（6 字节），超时返回 `Timeout` 或 `ShortRead`
    fn receive(&mut self) -> Result<Frame, LinkError>;

    /// 丢弃输入缓冲里尚未读取的字节
    ///
    /// 短帧或迟到的应答会留下残余字节，不清掉的话之后每一帧都会错位。
    /// 每次写出请求前调用。
    fn clear_input(&mut self) -> Result<(), LinkError>;
}

impl<L: RoverLink + ?Sized> RoverLink for &mut L {
    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> Result<Frame, LinkError> {
        (**self).receive()
    }

    fn clear_input(&mut self) -> Result<(), LinkError> {
        (**self).clear_input()
    }
}

impl<L: RoverLink + ?Sized> RoverLink for Box<L> {
    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> Result<Frame, LinkError> {
        (**self).receive()
    }

    fn clear_input(&mut self) -> Result<(), LinkError> {
        (**self).clear_input()
    }
}
