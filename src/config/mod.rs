/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和校验
use crate::core::error::GalaxyError;
use crate::galaxy::parameters::{GalaxyParameters, ParameterKey, ParameterValue};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub mod generation;
pub mod viewport;

pub use generation::GenerationConfig;
pub use viewport::ViewportConfig;

/// 配置文件名
pub const CONFIG_FILE_STEM: &str = "galaxy";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
    /// 星系参数不合法
    #[error("Invalid galaxy parameters: {0}")]
    Galaxy(#[from] GalaxyError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 配置来源
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
}

/// 应用主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 星系参数
    pub galaxy: GalaxyParameters,

    /// 生成配置
    pub generation: GenerationConfig,

    /// 视口配置
    pub viewport: ViewportConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    ///
    /// 无法解析或不合法的值会被忽略并记录警告，原值保留。
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// 使用任意查找函数覆盖配置（便于测试）
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // 星系参数
        let galaxy_vars = [
            ("GALAXY_PARTICLE_COUNT", ParameterKey::ParticleCount),
            ("GALAXY_PARTICLE_SIZE", ParameterKey::ParticleSize),
            ("GALAXY_RADIUS", ParameterKey::Radius),
            ("GALAXY_BRANCH_COUNT", ParameterKey::BranchCount),
            ("GALAXY_SPIN", ParameterKey::Spin),
            ("GALAXY_RANDOMNESS", ParameterKey::Randomness),
            ("GALAXY_RANDOMNESS_POWER", ParameterKey::RandomnessPower),
            ("GALAXY_INSIDE_COLOR", ParameterKey::InsideColor),
            ("GALAXY_OUTSIDE_COLOR", ParameterKey::OutsideColor),
        ];
        for (name, key) in galaxy_vars {
            if let Some(raw) = lookup(name) {
                let result = ParameterValue::parse_for(key, &raw)
                    .and_then(|value| self.galaxy.set(key, value));
                if let Err(e) = result {
                    tracing::warn!(target: "config", "Ignoring {}={}: {}", name, raw, e);
                }
            }
        }

        // 生成配置
        if let Some(val) = lookup("GALAXY_SEED") {
            if let Ok(seed) = val.parse() {
                self.generation.seed = Some(seed);
            }
        }
        if let Some(val) = lookup("GALAXY_BACKGROUND") {
            self.generation.background = val.parse().unwrap_or(self.generation.background);
        }

        // 日志配置
        if let Some(val) = lookup("GALAXY_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.generation.validate()?;
        self.viewport.validate()?;
        self.galaxy
            .validate_with_limit(self.generation.max_particle_count)?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./galaxy.toml
    /// 2. ./galaxy.json
    /// 3. <配置目录>/galaxy_generator/galaxy.toml
    /// 4. 使用默认配置
    ///
    /// 找到但无法解析的文件会被跳过。
    pub fn load_or_default() -> (Self, ConfigSource) {
        let toml_path = PathBuf::from(format!("{}.toml", CONFIG_FILE_STEM));
        if let Ok(config) = Self::from_toml_file(&toml_path) {
            return (config, ConfigSource::File(toml_path));
        }

        let json_path = PathBuf::from(format!("{}.json", CONFIG_FILE_STEM));
        if let Ok(config) = Self::from_json_file(&json_path) {
            return (config, ConfigSource::File(json_path));
        }

        if let Some(dir) = dirs::config_dir() {
            let config_path = dir
                .join("galaxy_generator")
                .join(format!("{}.toml", CONFIG_FILE_STEM));
            if let Ok(config) = Self::from_toml_file(&config_path) {
                return (config, ConfigSource::File(config_path));
            }
        }

        (Self::default(), ConfigSource::Default)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

use crate::impl_default;

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!(
                "unknown log level `{}`",
                other
            ))),
        }
    }
}
