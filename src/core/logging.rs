//! 日志初始化

use crate::config::{LogLevel, LoggingConfig};

/// 初始化日志系统
///
/// 配置tracing日志框架。`RUST_LOG` 环境变量优先，
/// 未设置时使用 `LoggingConfig` 中的级别。重复调用是安全的。
pub fn initialize_logging(config: &LoggingConfig) {
    if !config.log_to_console {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.as_filter()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::info!(target: "galaxy", "Logging initialised at {:?}", config.level);
}

impl LogLevel {
    /// 对应的 `EnvFilter` 指令
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_logging_twice() {
        let config = LoggingConfig::default();
        initialize_logging(&config);
        initialize_logging(&config);
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
    }
}
