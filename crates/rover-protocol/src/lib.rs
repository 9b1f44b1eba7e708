//! # Rover Protocol
//!
//! 小车串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 操作码（opcode）与固定请求帧
//! - `command`: 运动指令常量与脚本帧编码（校验和）
//! - `feedback`: 小车应答帧解析
//!
//! ## 帧格式
//!
//! 双向均为固定 6 字节：`opcode, p1, p2, p3, p4, checksum`。

use std::fmt;

pub mod command;
pub mod feedback;
pub mod ids;

// 重新导出常用类型
pub use command::*;
pub use feedback::*;
pub use ids::*;

use thiserror::Error;

/// 帧长度（字节），收发两个方向一致
pub const FRAME_LEN: usize = 6;

/// 串口链路上的固定 6 字节帧
///
/// `Frame` 是协议层和链路层之间的中间抽象：
/// - 协议层通过 `TryFrom<Frame>` 解析应答，通过常量 / `build_scripted_frame()` 构建请求
/// - 链路层（rover-link）只负责把 6 个字节写出去、读回来
///
/// # 示例
///
/// ```rust
/// use rover_protocol::{Frame, Opcode};
///
/// let frame = Frame::new([0xBA, 0xA0, 0x20, 0x0F, 0x0F, 0x07]);
/// assert_eq!(frame.opcode(), 0xBA);
/// assert_eq!(frame.params(), [0xA0, 0x20, 0x0F, 0x0F]);
/// assert_eq!(frame.checksum(), 0x07);
/// assert_eq!(frame.to_string(), "baa0200f0f07");
/// assert_eq!(Opcode::try_from(frame.opcode()).unwrap(), Opcode::MoveDistance);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// 从原始字节构建
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// 由操作码与 4 字节参数构建，校验和字节单独给出
    pub const fn from_parts(opcode: u8, params: [u8; 4], checksum: u8) -> Self {
        Self([
            opcode, params[0], params[1], params[2], params[3], checksum,
        ])
    }

    /// 操作码（byte 0）
    pub const fn opcode(&self) -> u8 {
        self.0[0]
    }

    /// 参数 p1..p4（byte 1..=4）
    pub const fn params(&self) -> [u8; 4] {
        [self.0[1], self.0[2], self.0[3], self.0[4]]
    }

    /// 校验和（byte 5）
    pub const fn checksum(&self) -> u8 {
        self.0[5]
    }

    /// 完整字节
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// 按下标读取单个字节，`index` 必须小于 `FRAME_LEN`
    pub(crate) const fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }
}

impl From<[u8; FRAME_LEN]> for Frame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Frame> for [u8; FRAME_LEN] {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| ProtocolError::InvalidLength {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 以小写十六进制显示，与链路日志一致
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unexpected opcode: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedOpcode { expected: u8, actual: u8 },

    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),
}
