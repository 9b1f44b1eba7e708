//! 运动指令帧
//!
//! 预定义的运动指令常量，以及课程脚本参数到完整帧的编码。

use crate::ids::{OP_MOVE_DISTANCE, OP_MOVE_UNTIL_STOP};
use crate::Frame;

/// 校验和掩码（`0001 0111`）
///
/// 小车固件只比较参数和的这几位，这里必须保持一致，不能换成完整的 8 位和。
pub const CHECKSUM_MASK: u8 = 0x17;

/// 半速前进，直到小车自行停止
pub const HALF_FORWARD: Frame = Frame::new([OP_MOVE_UNTIL_STOP, 0xA0, 0x20, 0xFF, 0xFF, 0x00]);

/// 前进 15 cm（0.5 ft）
pub const FORWARD_15CM: Frame = Frame::new([OP_MOVE_DISTANCE, 0xA0, 0x20, 0x0F, 0x0F, 0x00]);

/// 前进 45 cm（1.5 ft）
pub const FORWARD_45CM: Frame = Frame::new([OP_MOVE_DISTANCE, 0xA0, 0x20, 0x2D, 0x2D, 0x00]);

/// 原地左转 90°
pub const TURN_LEFT_90: Frame = Frame::new([OP_MOVE_DISTANCE, 0xE0, 0x20, 0x12, 0x12, 0x00]);

/// 原地右转 90°
pub const TURN_RIGHT_90: Frame = Frame::new([OP_MOVE_DISTANCE, 0xA0, 0x60, 0x12, 0x12, 0x00]);

/// 计算脚本帧校验和：`(p1 + p2 + p3 + p4) & 0x17`
pub fn checksum(params: [u8; 4]) -> u8 {
    let sum: u16 = params.iter().map(|&b| u16::from(b)).sum();
    (sum & u16::from(CHECKSUM_MASK)) as u8
}

/// 由 4 字节参数构建固定距离运动帧
///
/// 前置操作码 `0xBA`，第 6 字节写入校验和。纯函数，无错误分支。
///
/// # 示例
///
/// ```rust
/// use rover_protocol::build_scripted_frame;
///
/// let frame = build_scripted_frame([0xA0, 0x20, 0x0F, 0x0F]);
/// assert_eq!(frame.as_bytes(), &[0xBA, 0xA0, 0x20, 0x0F, 0x0F, 0x16]);
/// ```
pub fn build_scripted_frame(params: [u8; 4]) -> Frame {
    Frame::from_parts(OP_MOVE_DISTANCE, params, checksum(params))
}

/// 校验脚本帧的校验和
pub fn verify_checksum(frame: &Frame) -> bool {
    frame.checksum() == checksum(frame.params())
}
