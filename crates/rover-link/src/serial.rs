//! 串口后端
//!
//! 基于 `serialport` 的点对点串口链路，8N1，无流控。

use crate::{LinkError, RoverLink};
use rover_protocol::{FRAME_LEN, Frame};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// 默认读取超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// 串口配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// 串口路径（如 `/dev/ttyUSB0`、`COM3`）
    pub path: String,
    /// 波特率
    pub baud_rate: u32,
    /// 单帧读取超时
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// 串口链路
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
    timeout: Duration,
    path: String,
}

impl SerialLink {
    /// 打开串口
    pub fn open(config: &SerialConfig) -> Result<Self, LinkError> {
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(|e| LinkError::Open {
                path: config.path.clone(),
                message: e.to_string(),
            })?;

        debug!(
            "Opened serial port {} at {} baud",
            config.path, config.baud_rate
        );

        Ok(Self {
            port,
            timeout: config.timeout,
            path: config.path.clone(),
        })
    }

    /// 串口路径
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RoverLink for SerialLink {
    fn send(&mut self, frame: &Frame) -> Result<(), LinkError> {
        self.port.write_all(frame.as_bytes())?;
        self.port.flush()?;
        trace!("{} <- {}", self.path, frame);
        Ok(())
    }

    fn receive(&mut self) -> Result<Frame, LinkError> {
        let mut buf = [0u8; FRAME_LEN];
        let mut filled = 0;
        let deadline = Instant::now() + self.timeout;

        // 串口驱动可能分多次返回，累积到 6 字节或超时为止
        while filled < FRAME_LEN && Instant::now() < deadline {
            match self.port.read(&mut buf[filled..]) {
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::Io(e)),
            }
        }

        match filled {
            0 => {
                trace!("Receive timeout on {}", self.path);
                Err(LinkError::Timeout)
            },
            n if n < FRAME_LEN => Err(LinkError::ShortRead {
                expected: FRAME_LEN,
                actual: n,
            }),
            _ => {
                let frame = Frame::new(buf);
                trace!("{} -> {}", self.path, frame);
                Ok(frame)
            },
        }
    }

    fn clear_input(&mut self) -> Result<(), LinkError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(std::io::Error::from)?;
        Ok(())
    }
}
