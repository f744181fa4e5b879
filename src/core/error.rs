//! 统一错误处理模块
//!
//! 提供生成器范围内的错误类型定义
//!
//! ## 错误类型分层
//!
//! - **生成层错误** (`GalaxyError`): 参数校验、参数写入、后台生成
//! - **渲染层错误** (`RenderError`): 点云缓冲区的上传与释放
//!
//! 配置文件相关的错误见 `config::ConfigError`。

use thiserror::Error;

/// 星系生成器错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalaxyError {
    /// 参数违反约束，`field` 为驼峰形式的参数名
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Type mismatch for `{field}`: expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Generation worker disconnected")]
    WorkerDisconnected,
}

impl GalaxyError {
    /// 构造参数校验错误
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// 出错的参数名（如果有）
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { field, .. } | Self::TypeMismatch { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// 渲染边界错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to create point buffer: {0}")]
    BufferCreation(String),

    #[error("Unknown buffer handle: {0}")]
    UnknownHandle(u64),

    #[error("Invalid render state: {0}")]
    InvalidState(String),
}

pub type GalaxyResult<T> = Result<T, GalaxyError>;
pub type RenderResult<T> = Result<T, RenderError>;
