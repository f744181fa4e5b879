//! 核心模块
//!
//! 包含生成器的基础设施：
//! - `error` - 错误类型定义
//! - `logging` - tracing 日志初始化
//! - `macros` - 配置类型共用的宏

pub mod error;
pub mod logging;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{GalaxyError, GalaxyResult, RenderError, RenderResult};
pub use logging::initialize_logging;
