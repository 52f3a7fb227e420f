//! 中间件模块
//!
//! 提供审计日志和安全响应头中间件

pub mod audit;
pub mod security;

pub use audit::audit_middleware;
pub use security::security_headers;
