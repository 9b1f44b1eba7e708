//! # Rover CLI
//!
//! 通过串口驱动小车：按课程文件逐条执行运动指令，或使用导航引擎自主行驶。
//!
//! ```bash
//! # 脚本模式：课程走完后退出
//! rover-cli /dev/ttyUSB0 course.txt
//!
//! # 自主模式：Ctrl+C 停止
//! rover-cli /dev/ttyUSB0 course.txt --use-algorithm
//!
//! # 只采集传感器数据（诊断）
//! rover-cli /dev/ttyUSB0 course.txt --just-sensors
//! ```
//!
//! 日志级别通过 `RUST_LOG` 调整，例如 `RUST_LOG=rover_driver=debug` 打印每一帧。

use anyhow::{Context, Result};
use clap::Parser;
use rover_driver::{
    ControlLoop, Course, LoopMetrics, LoopOutcome, MoveSource, NavigationEngine, OperatingMode,
    SourceKind,
};
use rover_link::SerialLink;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::RoverConfig;

/// Rover CLI - 串口小车驱动
#[derive(Parser, Debug)]
#[command(name = "rover-cli")]
#[command(about = "Drive a rover over a serial link", long_about = None)]
#[command(version)]
struct Cli {
    /// 串口（如 /dev/ttyUSB0、COM3）
    port: String,

    /// 课程文件（每行 4 字节十六进制参数，# 开头为注释）
    command_file: PathBuf,

    /// 不采集传感器数据，只发送运动指令
    #[arg(short = 'n', long, conflicts_with = "just_sensors")]
    no_sensors: bool,

    /// 只采集传感器数据
    #[arg(short = 's', long)]
    just_sensors: bool,

    /// 使用导航引擎代替课程文件
    #[arg(short = 'a', long)]
    use_algorithm: bool,

    /// 波特率（覆盖配置文件）
    #[arg(long)]
    baud: Option<u32>,

    /// 单帧读取超时，毫秒（覆盖配置文件）
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// TOML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // 初始化日志
    let env_filter = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env_filter.as_deref()))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RoverConfig::load(path)?,
        None => RoverConfig::default(),
    };
    if let Some(baud) = cli.baud {
        config.link.baud_rate = baud;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.link.timeout_ms = timeout_ms;
    }

    let mode = OperatingMode::from_flags(cli.no_sensors, cli.just_sensors, cli.use_algorithm);

    // 课程先于串口加载：课程有误时不触碰硬件
    let course = Course::load(&cli.command_file)
        .with_context(|| format!("加载课程失败: {}", cli.command_file.display()))?;

    let link = SerialLink::open(&config.serial(&cli.port))
        .with_context(|| format!("打开串口失败: {}", cli.port))?;
    info!("Opened port {}", cli.port);

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::Release))
        .context("注册 Ctrl+C 处理失败")?;

    info!("****SIMULATION BEGIN****");

    let metrics = Arc::new(LoopMetrics::new());
    let outcome = match mode.source {
        SourceKind::Course => drive(link, course, mode, &config, &running, &metrics)?,
        SourceKind::Autonomous => {
            drive(link, NavigationEngine::new(), mode, &config, &running, &metrics)?
        },
    };

    let snapshot = metrics.snapshot();
    info!(
        "Frames sent: {}, received: {}, moves completed: {}, retries: {}",
        snapshot.frames_sent,
        snapshot.frames_received,
        snapshot.moves_completed,
        snapshot.retries()
    );

    match outcome {
        LoopOutcome::CourseComplete => info!("End of simulation!"),
        LoopOutcome::Stopped => info!("Stopped by user"),
    }

    Ok(())
}

/// 未设置 `RUST_LOG` 时的日志级别
const DEFAULT_LOG_FILTER: &str = "rover_cli=info,rover_driver=info";

/// `RUST_LOG` 有效时完全按它过滤，否则使用默认级别
fn log_filter(env: Option<&str>) -> EnvFilter {
    env.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn drive<S: MoveSource>(
    link: SerialLink,
    source: S,
    mode: OperatingMode,
    config: &RoverConfig,
    running: &Arc<AtomicBool>,
    metrics: &Arc<LoopMetrics>,
) -> Result<LoopOutcome> {
    let mut control = ControlLoop::new(link, source, mode)
        .with_timing(config.timing())
        .with_running_flag(running.clone())
        .with_metrics(metrics.clone());

    control.run().context("控制循环异常退出")
}
