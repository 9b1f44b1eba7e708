//! 配置文件
//!
//! 可选的 TOML 配置，优先级：命令行参数 > 配置文件 > 默认值。
//!
//! ```toml
//! [link]
//! baud_rate = 19200
//! timeout_ms = 1000
//!
//! [timing]
//! sensor_settle_ms = 100
//! pre_move_ms = 100
//! navigation_pacing_ms = 200
//! sensors_only_interval_ms = 500
//! ```

use anyhow::{Context, Result};
use rover_driver::LoopTiming;
use rover_link::SerialConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    pub link: LinkSection,
    pub timing: TimingSection,
}

/// 串口参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSection {
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            baud_rate: rover_link::serial::DEFAULT_BAUD_RATE,
            timeout_ms: 1000,
        }
    }
}

/// 链路节拍（毫秒）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    pub sensor_settle_ms: u64,
    pub pre_move_ms: u64,
    pub navigation_pacing_ms: u64,
    pub sensors_only_interval_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        let timing = LoopTiming::default();
        Self {
            sensor_settle_ms: timing.sensor_settle.as_millis() as u64,
            pre_move_ms: timing.pre_move.as_millis() as u64,
            navigation_pacing_ms: timing.navigation_pacing.as_millis() as u64,
            sensors_only_interval_ms: timing.sensors_only_interval.as_millis() as u64,
        }
    }
}

impl RoverConfig {
    /// 从 TOML 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 解析 TOML 文本
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 串口配置
    pub fn serial(&self, port: &str) -> SerialConfig {
        SerialConfig::new(port)
            .baud_rate(self.link.baud_rate)
            .timeout(Duration::from_millis(self.link.timeout_ms))
    }

    /// 链路节拍
    pub fn timing(&self) -> LoopTiming {
        LoopTiming {
            sensor_settle: Duration::from_millis(self.timing.sensor_settle_ms),
            pre_move: Duration::from_millis(self.timing.pre_move_ms),
            navigation_pacing: Duration::from_millis(self.timing.navigation_pacing_ms),
            sensors_only_interval: Duration::from_millis(self.timing.sensors_only_interval_ms),
        }
    }
}
