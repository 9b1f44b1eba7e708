//! Mock 链路
//!
//! 用于测试的脚本化小车：按顺序返回预设应答，并记录所有发出的帧。
//! 脚本耗尽后返回 `LinkError::Closed`，测试不会无限重试。
//!
//! 输入缓冲按真实串口建模：迟到应答的剩余字节留在缓冲里，成为下一次读取的开头，
//! 直到 `clear_input()` 把它们丢弃。

use crate::{LinkError, RoverLink};
use rover_protocol::{FRAME_LEN, Frame};
use std::collections::VecDeque;

/// 预设应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// 完整帧
    Frame(Frame),
    /// 超时（没有任何字节）
    Timeout,
    /// 超时前只收到 `received`，`trailing` 在超时之后才到达输入缓冲
    Short {
        received: Vec<u8>,
        trailing: Vec<u8>,
    },
}

/// 脚本化 Mock 链路
#[derive(Debug, Default)]
pub struct MockLink {
    replies: VecDeque<MockReply>,
    sent: Vec<Frame>,
    buffered: Vec<u8>,
    clears: usize,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条完整应答
    pub fn reply(mut self, bytes: [u8; FRAME_LEN]) -> Self {
        self.replies.push_back(MockReply::Frame(Frame::new(bytes)));
        self
    }

    /// 追加一次超时
    pub fn timeout(mut self) -> Self {
        self.replies.push_back(MockReply::Timeout);
        self
    }

    /// 追加一次不完整应答（缺失的字节不会再到达）
    pub fn short(mut self, bytes: &[u8]) -> Self {
        self.replies.push_back(MockReply::Short {
            received: bytes.to_vec(),
            trailing: Vec::new(),
        });
        self
    }

    /// 追加一条迟到应答：超时前只到达前 `on_time` 个字节，其余留在输入缓冲
    pub fn late(mut self, bytes: [u8; FRAME_LEN], on_time: usize) -> Self {
        let on_time = on_time.min(FRAME_LEN);
        self.replies.push_back(MockReply::Short {
            received: bytes[..on_time].to_vec(),
            trailing: bytes[on_time..].to_vec(),
        });
        self
    }

    /// 已发出的所有帧（按发送顺序）
    pub fn sent(&self) -> &[Frame] {
        &self.sent
    }

    /// 剩余未消费的应答数
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// 输入缓冲中的残余字节
    pub fn buffered(&self) -> &[u8] {
        &self.buffered
    }

    /// `clear_input()` 被调用的次数
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl RoverLink for MockLink {
    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        self.sent.push(*frame);
        Ok(())
    }

    fn receive(&mut self) -> Result<Frame, LinkError> {
        match self.replies.pop_front() {
            Some(MockReply::Frame(frame)) => {
                if self.buffered.is_empty() {
                    return Ok(frame);
                }
                // 残余字节排在新应答前面，读到的帧整体错位
                self.buffered.extend_from_slice(frame.as_bytes());
                let rest = self.buffered.split_off(FRAME_LEN);
                let head = std::mem::replace(&mut self.buffered, rest);
                let mut bytes = [0u8; FRAME_LEN];
                bytes.copy_from_slice(&head);
                Ok(Frame::new(bytes))
            },
            Some(MockReply::Timeout) => Err(LinkError::Timeout),
            Some(MockReply::Short { received, trailing }) => {
                self.buffered.extend_from_slice(&trailing);
                if received.is_empty() {
                    Err(LinkError::Timeout)
                } else {
                    Err(LinkError::ShortRead {
                        expected: FRAME_LEN,
                        actual: received.len(),
                    })
                }
            },
            None => Err(LinkError::Closed),
        }
    }

    fn clear_input(&mut self) -> Result<(), LinkError> {
        self.buffered.clear();
        self.clears += 1;
        Ok(())
    }
}
