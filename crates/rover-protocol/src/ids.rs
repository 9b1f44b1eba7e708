//! 操作码常量定义和枚举
//!
//! 定义链路上所有帧的操作码（byte 0），以及零负载的固定请求帧。

use crate::{Frame, ProtocolError};
use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// 请求帧（主机 -> 小车）
// ============================================================================

/// 传感器数据请求
pub const OP_SENSOR_REQUEST: u8 = 0xAA;

/// 移动直到停止（半速前进）
pub const OP_MOVE_UNTIL_STOP: u8 = 0xBC;

/// 移动固定距离（方向/转向编码在 p1、p2）
pub const OP_MOVE_DISTANCE: u8 = 0xBA;

/// 距离/状态请求
pub const OP_DISTANCE_REQUEST: u8 = 0xBB;

// ============================================================================
// 应答帧（小车 -> 主机）
// ============================================================================

/// 传感器数据应答（同时作为有效标志）
pub const OP_SENSOR_RESPONSE: u8 = 0x01;

/// 运动指令确认
pub const OP_MOVE_ACK: u8 = 0x03;

/// 距离/状态应答
pub const OP_DISTANCE_RESPONSE: u8 = 0x04;

/// 传感器请求帧：`AA 00 00 00 00 00`
pub const SENSOR_REQUEST: Frame = Frame::new([OP_SENSOR_REQUEST, 0, 0, 0, 0, 0]);

/// 距离请求帧：`BB 00 00 00 00 00`
pub const DISTANCE_REQUEST: Frame = Frame::new([OP_DISTANCE_REQUEST, 0, 0, 0, 0, 0]);

/// 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// 传感器应答
    SensorResponse = 0x01,
    /// 运动确认
    MoveAck = 0x03,
    /// 距离应答
    DistanceResponse = 0x04,
    /// 传感器请求
    SensorRequest = 0xAA,
    /// 固定距离移动
    MoveDistance = 0xBA,
    /// 距离请求
    DistanceRequest = 0xBB,
    /// 移动直到停止
    MoveUntilStop = 0xBC,
}

impl Opcode {
    /// 从字节解析，未知操作码返回 `ProtocolError::UnknownOpcode`
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        Self::try_from(byte).map_err(|_| ProtocolError::UnknownOpcode(byte))
    }

    /// 是否为运动指令
    pub fn is_movement(self) -> bool {
        matches!(self, Opcode::MoveDistance | Opcode::MoveUntilStop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_byte() {
        assert_eq!(Opcode::from_byte(0xAA).unwrap(), Opcode::SensorRequest);
        assert_eq!(Opcode::from_byte(0x01).unwrap(), Opcode::SensorResponse);
        assert_eq!(Opcode::from_byte(0xBC).unwrap(), Opcode::MoveUntilStop);
        assert_eq!(Opcode::from_byte(0xBA).unwrap(), Opcode::MoveDistance);
        assert_eq!(Opcode::from_byte(0x03).unwrap(), Opcode::MoveAck);
        assert_eq!(Opcode::from_byte(0xBB).unwrap(), Opcode::DistanceRequest);
        assert_eq!(Opcode::from_byte(0x04).unwrap(), Opcode::DistanceResponse);
    }

    #[test]
    fn test_opcode_unknown() {
        assert_eq!(
            Opcode::from_byte(0x02).unwrap_err(),
            ProtocolError::UnknownOpcode(0x02)
        );
    }

    #[test]
    fn test_opcode_into_u8() {
        let byte: u8 = Opcode::DistanceRequest.into();
        assert_eq!(byte, 0xBB);
    }

    #[test]
    fn test_is_movement() {
        assert!(Opcode::MoveUntilStop.is_movement());
        assert!(Opcode::MoveDistance.is_movement());
        assert!(!Opcode::DistanceRequest.is_movement());
        assert!(!Opcode::MoveAck.is_movement());
    }

    #[test]
    fn test_request_frames() {
        assert_eq!(SENSOR_REQUEST.as_bytes(), &[0xAA, 0, 0, 0, 0, 0]);
        assert_eq!(DISTANCE_REQUEST.as_bytes(), &[0xBB, 0, 0, 0, 0, 0]);
    }
}
