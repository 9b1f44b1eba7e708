//! 应答帧解析模块
//!
//! 小车 -> 主机的三种应答：传感器数据、运动确认、距离/状态。
//! 每种应答都通过 `TryFrom<Frame>` 从原始帧解析，操作码不符时返回
//! `ProtocolError::UnexpectedOpcode`。

use crate::ids::{OP_DISTANCE_RESPONSE, OP_MOVE_ACK, OP_SENSOR_RESPONSE};
use crate::{Frame, ProtocolError};

/// 距离应答中的停止标志
pub const STOPPED_FLAG: u8 = 0x01;

fn expect_opcode(frame: &Frame, expected: u8) -> Result<(), ProtocolError> {
    if frame.opcode() == expected {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedOpcode {
            expected,
            actual: frame.opcode(),
        })
    }
}

// ============================================================================
// 传感器数据 (0x01)
// ============================================================================

/// 传感器数据帧
///
/// | byte | 含义 |
/// |---|---|
/// | 0 | 有效标志（`0x01`） |
/// | 1 | 前方距离 |
/// | 2 | 侧前方净空 |
/// | 3 | 侧后方净空 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFrame {
    raw: Frame,
}

impl SensorFrame {
    /// 前方距离
    pub fn front(&self) -> u8 {
        self.raw.byte(1)
    }

    /// 侧前方净空
    pub fn side_front(&self) -> u8 {
        self.raw.byte(2)
    }

    /// 侧后方净空
    pub fn side_back(&self) -> u8 {
        self.raw.byte(3)
    }

    /// 原始帧
    pub fn raw(&self) -> &Frame {
        &self.raw
    }
}

impl TryFrom<Frame> for SensorFrame {
    type Error = ProtocolError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        expect_opcode(&frame, OP_SENSOR_RESPONSE)?;
        Ok(Self { raw: frame })
    }
}

// ============================================================================
// 运动确认 (0x03)
// ============================================================================

/// 运动确认帧（参数为运动指令的回显）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveAck {
    raw: Frame,
}

impl MoveAck {
    /// 回显的运动参数
    pub fn echoed_params(&self) -> [u8; 4] {
        self.raw.params()
    }

    /// 原始帧
    pub fn raw(&self) -> &Frame {
        &self.raw
    }
}

impl TryFrom<Frame> for MoveAck {
    type Error = ProtocolError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        expect_opcode(&frame, OP_MOVE_ACK)?;
        Ok(Self { raw: frame })
    }
}

// ============================================================================
// 距离/状态 (0x04)
// ============================================================================

/// 距离/状态应答帧
///
/// byte 1 为停止标志（`0x01` = 已停止），byte 2、byte 3 为两侧累计行驶距离。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceFrame {
    raw: Frame,
}

impl DistanceFrame {
    /// 小车是否已停止（本次运动完成）
    pub fn is_stopped(&self) -> bool {
        self.raw.byte(1) == STOPPED_FLAG
    }

    /// 累计行驶距离（两个分量）
    pub fn travelled(&self) -> [u8; 2] {
        [self.raw.byte(2), self.raw.byte(3)]
    }

    /// 原始帧
    pub fn raw(&self) -> &Frame {
        &self.raw
    }
}

impl TryFrom<Frame> for DistanceFrame {
    type Error = ProtocolError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        expect_opcode(&frame, OP_DISTANCE_RESPONSE)?;
        Ok(Self { raw: frame })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_frame_parse() {
        let frame = Frame::new([0x01, 0x64, 0x5A, 0x30, 0x00, 0x00]);
        let sensor = SensorFrame::try_from(frame).unwrap();
        assert_eq!(sensor.front(), 0x64);
        assert_eq!(sensor.side_front(), 0x5A);
        assert_eq!(sensor.side_back(), 0x30);
        assert_eq!(sensor.raw(), &frame);
    }

    #[test]
    fn test_sensor_frame_invalid_flag() {
        let frame = Frame::new([0x00, 0x64, 0x5A, 0x30, 0x00, 0x00]);
        assert_eq!(
            SensorFrame::try_from(frame).unwrap_err(),
            ProtocolError::UnexpectedOpcode {
                expected: 0x01,
                actual: 0x00
            }
        );
    }

    #[test]
    fn test_move_ack_parse() {
        let frame = Frame::new([0x03, 0xA0, 0x20, 0x0F, 0x0F, 0x16]);
        let ack = MoveAck::try_from(frame).unwrap();
        assert_eq!(ack.echoed_params(), [0xA0, 0x20, 0x0F, 0x0F]);

        let wrong = Frame::new([0x04, 0x01, 0, 0, 0, 0]);
        assert!(MoveAck::try_from(wrong).is_err());
    }

    #[test]
    fn test_distance_frame_stopped() {
        let frame = Frame::new([0x04, 0x01, 0x20, 0x21, 0x00, 0x00]);
        let distance = DistanceFrame::try_from(frame).unwrap();
        assert!(distance.is_stopped());
        assert_eq!(distance.travelled(), [0x20, 0x21]);
    }

    #[test]
    fn test_distance_frame_moving() {
        let frame = Frame::new([0x04, 0x00, 0x05, 0x06, 0x00, 0x00]);
        let distance = DistanceFrame::try_from(frame).unwrap();
        assert!(!distance.is_stopped());
        assert_eq!(distance.travelled(), [0x05, 0x06]);
    }

    #[test]
    fn test_distance_frame_wrong_opcode() {
        let frame = Frame::new([0x03, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(
            DistanceFrame::try_from(frame),
            Err(ProtocolError::UnexpectedOpcode {
                expected: 0x04,
                actual: 0x03
            })
        ));
    }
}
