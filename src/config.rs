use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppResult, SessionError};

/// 指向 TOML 配置文件的环境变量
pub const CONFIG_PATH_ENV: &str = "EXAM_PROCTOR_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 题库 API 配置 ---
    pub repository_base_url: String,
    pub repository_api_key: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 是否开启监考
    pub proctoring_enabled: bool,
    // --- 监考配置 ---
    /// 两次违规之间的冷却时间（秒）
    pub violation_cooldown_secs: u64,
    /// 达到该违规次数后强制结束考试
    pub max_violations: u32,
    /// 摄像头采样间隔（毫秒）
    pub sampling_interval_ms: u64,
    /// 全屏检查间隔（毫秒）
    pub compliance_poll_interval_ms: u64,
    /// 停止摄像头线程时的最长等待（毫秒）
    pub camera_stop_timeout_ms: u64,
    /// 单帧采集超时（毫秒）
    pub capture_timeout_ms: u64,
    // --- 考试计时配置 ---
    /// 倒计时节拍（毫秒），每个节拍扣减一秒
    pub timer_tick_interval_ms: u64,
    /// 时长大于该值时按秒处理，否则按分钟处理
    pub duration_seconds_threshold: u64,
    /// 剩余时间低于该值（秒）时提示
    pub low_time_warning_secs: u64,
    /// 是否校验考试开放时间段
    pub enforce_availability_window: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository_base_url: "http://localhost:54321".to_string(),
            repository_api_key: String::new(),
            verbose_logging: false,
            proctoring_enabled: true,
            violation_cooldown_secs: 10,
            max_violations: 5,
            sampling_interval_ms: 100,
            compliance_poll_interval_ms: 1000,
            camera_stop_timeout_ms: 1000,
            capture_timeout_ms: 500,
            timer_tick_interval_ms: 1000,
            duration_seconds_threshold: 300,
            low_time_warning_secs: 300,
            enforce_availability_window: true,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            repository_base_url: std::env::var("REPOSITORY_BASE_URL")
                .unwrap_or(default.repository_base_url),
            repository_api_key: std::env::var("REPOSITORY_API_KEY")
                .unwrap_or(default.repository_api_key),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            proctoring_enabled: env_or("PROCTORING_ENABLED", default.proctoring_enabled),
            violation_cooldown_secs: env_or(
                "VIOLATION_COOLDOWN_SECS",
                default.violation_cooldown_secs,
            ),
            max_violations: env_or("MAX_VIOLATIONS", default.max_violations),
            sampling_interval_ms: env_or("SAMPLING_INTERVAL_MS", default.sampling_interval_ms),
            compliance_poll_interval_ms: env_or(
                "COMPLIANCE_POLL_INTERVAL_MS",
                default.compliance_poll_interval_ms,
            ),
            camera_stop_timeout_ms: env_or(
                "CAMERA_STOP_TIMEOUT_MS",
                default.camera_stop_timeout_ms,
            ),
            capture_timeout_ms: env_or("CAPTURE_TIMEOUT_MS", default.capture_timeout_ms),
            timer_tick_interval_ms: env_or(
                "TIMER_TICK_INTERVAL_MS",
                default.timer_tick_interval_ms,
            ),
            duration_seconds_threshold: env_or(
                "DURATION_SECONDS_THRESHOLD",
                default.duration_seconds_threshold,
            ),
            low_time_warning_secs: env_or("LOW_TIME_WARNING_SECS", default.low_time_warning_secs),
            enforce_availability_window: env_or(
                "ENFORCE_AVAILABILITY_WINDOW",
                default.enforce_availability_window,
            ),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 优先读取 `EXAM_PROCTOR_CONFIG` 指向的文件，否则读取环境变量
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_toml_file(Path::new(&path)),
            Err(_) => Ok(Self::from_env()),
        }
    }

    pub fn proctoring(&self) -> ProctoringConfig {
        ProctoringConfig {
            violation_cooldown: Duration::from_secs(self.violation_cooldown_secs),
            max_violations: self.max_violations,
            sampling_interval: Duration::from_millis(self.sampling_interval_ms),
            compliance_poll_interval: Duration::from_millis(self.compliance_poll_interval_ms),
            camera_stop_timeout: Duration::from_millis(self.camera_stop_timeout_ms),
            capture_timeout: Duration::from_millis(self.capture_timeout_ms),
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(self.timer_tick_interval_ms),
            duration_seconds_threshold: self.duration_seconds_threshold,
            low_time_warning_secs: self.low_time_warning_secs,
            enforce_availability_window: self.enforce_availability_window,
        }
    }
}

/// 监考相关配置
#[derive(Clone, Debug)]
pub struct ProctoringConfig {
    pub violation_cooldown: Duration,
    pub max_violations: u32,
    pub sampling_interval: Duration,
    pub compliance_poll_interval: Duration,
    pub camera_stop_timeout: Duration,
    pub capture_timeout: Duration,
}

impl Default for ProctoringConfig {
    fn default() -> Self {
        Config::default().proctoring()
    }
}

impl ProctoringConfig {
    /// 检查采集线程参数，不合法时视线检测需要降级为不可用
    pub fn validate(&self) -> AppResult<()> {
        if self.sampling_interval.is_zero() {
            return Err(SessionError::Configuration("采样间隔不能为 0".to_string()));
        }
        if self.capture_timeout.is_zero() {
            return Err(SessionError::Configuration("采集超时不能为 0".to_string()));
        }
        if self.max_violations == 0 {
            return Err(SessionError::Configuration("违规上限不能为 0".to_string()));
        }
        Ok(())
    }
}

/// 考试会话相关配置
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub tick_interval: Duration,
    pub duration_seconds_threshold: u64,
    pub low_time_warning_secs: u64,
    pub enforce_availability_window: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Config::default().session()
    }
}
