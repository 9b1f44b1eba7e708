//! 课程（脚本模式的运动指令序列）
//!
//! 课程文件为纯文本，每行一条指令：
//!
//! ```text
//! # 整行注释
//! A0200F0F        # 4 字节参数，可带行尾注释
//! E0 20 12 12     # 字节之间可以有空白，字节内部不行
//! A0200F0F00      # 第 5 字节是校验和占位，会被重新计算
//! ```
//!
//! 每条数据行经 `build_scripted_frame()` 编码为完整帧。任何一行解析失败都会
//! 使整个课程加载失败（`DriverError::MalformedCourseLine`），不做部分恢复。

use crate::error::DriverError;
use crate::source::{DistanceTracker, MoveSource};
use rover_protocol::{DistanceFrame, Frame, SensorFrame, build_scripted_frame, checksum};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// 注释标记
pub const COMMENT_MARKER: char = '#';

/// 预设运动指令序列及其游标
#[derive(Debug, Clone, Default)]
pub struct Course {
    commands: Vec<Frame>,
    current_place: usize,
    distance: DistanceTracker,
    last_sensor: Option<SensorFrame>,
}

impl Course {
    /// 由已编码的帧构建课程
    pub fn new(commands: Vec<Frame>) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }

    /// 解析课程文本
    pub fn parse(text: &str) -> Result<Self, DriverError> {
        let mut commands = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            if let Some(params) = parse_line(raw, index + 1)? {
                let frame = build_scripted_frame(params);
                debug!("Read in movement command {}", frame);
                commands.push(frame);
            }
        }

        Ok(Self::new(commands))
    }

    /// 从文件加载课程
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let text = fs::read_to_string(path.as_ref())?;
        let course = Self::parse(&text)?;
        info!(
            "Loaded {} movement commands from {}",
            course.len(),
            path.as_ref().display()
        );
        Ok(course)
    }

    /// 指令总数
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// 当前游标（已完成的指令数）
    pub fn current_place(&self) -> usize {
        self.current_place
    }

    /// 全部指令
    pub fn commands(&self) -> &[Frame] {
        &self.commands
    }

    /// 当前待执行的指令
    pub fn current(&self) -> Option<&Frame> {
        self.commands.get(self.current_place)
    }

    /// 最近一次传感器数据（脚本模式下只保存，不参与决策）
    pub fn last_sensor_frame(&self) -> Option<&SensorFrame> {
        self.last_sensor.as_ref()
    }

    /// 距离跟踪状态
    pub fn distance(&self) -> &DistanceTracker {
        &self.distance
    }
}

impl MoveSource for Course {
    fn receive_sensor_frame(&mut self, frame: SensorFrame) {
        self.last_sensor = Some(frame);
    }

    fn next_move(&mut self) -> Option<Frame> {
        self.current().copied()
    }

    fn report_move_outcome(&mut self, response: &DistanceFrame) -> bool {
        let complete = self.distance.update(response);
        if complete && !self.is_finished() {
            self.current_place += 1;
            info!(
                "Course progress {}/{}",
                self.current_place,
                self.commands.len()
            );
        }
        complete
    }

    fn is_finished(&self) -> bool {
        self.current_place >= self.commands.len()
    }
}

/// 解析一行课程文本
///
/// 注释行与空行返回 `Ok(None)`。
fn parse_line(raw: &str, line: usize) -> Result<Option<[u8; 4]>, DriverError> {
    if raw.starts_with(COMMENT_MARKER) {
        return Ok(None);
    }

    let payload = raw.split(COMMENT_MARKER).next().unwrap_or_default().trim();
    if payload.is_empty() {
        return Ok(None);
    }

    // 空白只能出现在完整的字节之间
    let groups: Vec<&str> = payload.split_whitespace().collect();
    if groups.len() > 1 && groups.iter().any(|group| group.len() % 2 != 0) {
        return Err(DriverError::MalformedCourseLine {
            line,
            reason: format!("hex byte split by whitespace in {:?}", payload),
        });
    }
    let digits = groups.concat();

    let bytes = hex::decode(&digits).map_err(|e| DriverError::MalformedCourseLine {
        line,
        reason: format!("invalid hex {:?}: {}", payload, e),
    })?;

    match bytes.as_slice() {
        &[p1, p2, p3, p4] => Ok(Some([p1, p2, p3, p4])),
        &[p1, p2, p3, p4, placeholder] => {
            let params = [p1, p2, p3, p4];
            if placeholder != checksum(params) {
                debug!(
                    "Line {}: checksum placeholder 0x{:02X} replaced by 0x{:02X}",
                    line,
                    placeholder,
                    checksum(params)
                );
            }
            Ok(Some(params))
        },
        other => Err(DriverError::MalformedCourseLine {
            line,
            reason: format!("expected 4 bytes, got {}", other.len()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments() {
        let course = Course::parse("# header\nA0200F0F\n#comment\nE0201212\n").unwrap();
        assert_eq!(course.len(), 2);
        assert_eq!(
            course.commands()[0],
            build_scripted_frame([0xA0, 0x20, 0x0F, 0x0F])
        );
        assert_eq!(
            course.commands()[1],
            build_scripted_frame([0xE0, 0x20, 0x12, 0x12])
        );
    }

    #[test]
    fn test_parse_inline_comment_and_whitespace() {
        let course = Course::parse("  a0 20 0f 0f   # forward\r\nE0201212#left\n").unwrap();
        assert_eq!(course.len(), 2);
        assert_eq!(course.commands()[0].params(), [0xA0, 0x20, 0x0F, 0x0F]);
        assert_eq!(course.commands()[1].params(), [0xE0, 0x20, 0x12, 0x12]);
    }

    #[test]
    fn test_parse_whitespace_only_between_bytes() {
        let course = Course::parse("A020 0F0F\n").unwrap();
        assert_eq!(course.commands()[0].params(), [0xA0, 0x20, 0x0F, 0x0F]);

        for text in ["A 0200F0F\n", "A0200 F0F\n", "A0 2 00F0F\n"] {
            match Course::parse(text) {
                Err(DriverError::MalformedCourseLine { line, reason }) => {
                    assert_eq!(line, 1);
                    assert!(reason.contains("split by whitespace"), "{}", reason);
                },
                other => panic!("Expected MalformedCourseLine for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_checksum_placeholder() {
        let course = Course::parse("A0200F0F00\n").unwrap();
        assert_eq!(
            course.commands()[0].as_bytes(),
            &[0xBA, 0xA0, 0x20, 0x0F, 0x0F, 0x16]
        );
    }

    #[test]
    fn test_parse_blank_lines_skipped() {
        let course = Course::parse("\nA0200F0F\n\n   \n").unwrap();
        assert_eq!(course.len(), 1);
    }

    #[test]
    fn test_parse_invalid_hex() {
        let err = Course::parse("A0200F0F\nZZ200F0F\n").unwrap_err();
        match err {
            DriverError::MalformedCourseLine { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected MalformedCourseLine, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_odd_digit_count() {
        assert!(matches!(
            Course::parse("A0200F0\n"),
            Err(DriverError::MalformedCourseLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_wrong_length() {
        let err = Course::parse("# c\nA020\n").unwrap_err();
        match err {
            DriverError::MalformedCourseLine { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("got 2"), "{}", reason);
            },
            other => panic!("Expected MalformedCourseLine, got {:?}", other),
        }

        assert!(Course::parse("A0200F0F0000\n").is_err());
    }

    #[test]
    fn test_empty_course_is_finished() {
        let course = Course::parse("# nothing here\n").unwrap();
        assert!(course.is_empty());
        assert!(course.is_finished());
    }

    #[test]
    fn test_cursor_advances_only_on_completion() {
        let mut course = Course::parse("A0200F0F\nE0201212\n").unwrap();
        let first = course.next_move().unwrap();

        let moving = DistanceFrame::try_from(Frame::new([0x04, 0x00, 5, 5, 0, 0])).unwrap();
        assert!(!course.report_move_outcome(&moving));
        assert_eq!(course.current_place(), 0);
        assert_eq!(course.next_move(), Some(first));

        let stopped = DistanceFrame::try_from(Frame::new([0x04, 0x01, 9, 9, 0, 0])).unwrap();
        assert!(course.report_move_outcome(&stopped));
        assert_eq!(course.current_place(), 1);
        assert_ne!(course.next_move(), Some(first));

        assert!(course.report_move_outcome(&stopped));
        assert_eq!(course.current_place(), 2);
        assert!(course.is_finished());
        assert_eq!(course.next_move(), None);

        // 课程结束后游标不再前进
        assert!(course.report_move_outcome(&stopped));
        assert_eq!(course.current_place(), 2);
    }

    #[test]
    fn test_course_stores_sensor_frame() {
        let mut course = Course::default();
        let sensor = SensorFrame::try_from(Frame::new([0x01, 1, 2, 3, 0, 0])).unwrap();
        course.receive_sensor_frame(sensor);
        assert_eq!(course.last_sensor_frame(), Some(&sensor));
    }
}
