//! 运行模式定义
//!
//! 三个独立开关（跳过传感器、仅传感器、自主导航）在进入驱动层之前
//! 折叠成一个枚举配置，控制循环只读取它，不再重新推导。

/// 传感器采集方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorMode {
    /// 每个周期先采集传感器数据（默认）
    #[default]
    Gather,

    /// 跳过传感器采集，直接发送运动指令
    Skip,

    /// 只采集传感器数据（诊断模式），从不发送运动指令
    Only,
}

/// 运动指令来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// 预设课程（脚本模式），课程走完即结束
    #[default]
    Course,

    /// 导航引擎（自主模式），不会自然结束
    Autonomous,
}

/// 控制循环运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatingMode {
    pub sensors: SensorMode,
    pub source: SourceKind,
}

impl OperatingMode {
    /// 由命令行的三个开关构建
    ///
    /// `no_sensors` 优先于 `just_sensors`。
    pub fn from_flags(no_sensors: bool, just_sensors: bool, use_algorithm: bool) -> Self {
        let sensors = if no_sensors {
            SensorMode::Skip
        } else if just_sensors {
            SensorMode::Only
        } else {
            SensorMode::Gather
        };
        let source = if use_algorithm {
            SourceKind::Autonomous
        } else {
            SourceKind::Course
        };
        Self { sensors, source }
    }

    /// 是否为脚本模式
    pub fn is_scripted(self) -> bool {
        self.source == SourceKind::Course
    }

    /// 是否为自主模式
    pub fn is_autonomous(self) -> bool {
        self.source == SourceKind::Autonomous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        let mode = OperatingMode::default();
        assert_eq!(mode.sensors, SensorMode::Gather);
        assert_eq!(mode.source, SourceKind::Course);
        assert!(mode.is_scripted());
    }

    #[test]
    fn test_from_flags() {
        let mode = OperatingMode::from_flags(true, false, true);
        assert_eq!(mode.sensors, SensorMode::Skip);
        assert!(mode.is_autonomous());

        let mode = OperatingMode::from_flags(false, true, false);
        assert_eq!(mode.sensors, SensorMode::Only);
        assert!(mode.is_scripted());
    }

    #[test]
    fn test_skip_wins_over_only() {
        let mode = OperatingMode::from_flags(true, true, false);
        assert_eq!(mode.sensors, SensorMode::Skip);
    }
}
