//! 管理后台错误类型定义
//!
//! 层级服务错误在这里统一映射为 HTTP 状态码和响应信封。

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use subcategory_hierarchy::HierarchyError;

/// 管理后台错误类型
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 资源不存在
    #[error("子分类不存在: {0}")]
    SubcategoryNotFound(i64),
    #[error("父级子分类不存在: {0}")]
    ParentNotFound(i64),
    #[error("分类不存在: {0}")]
    CategoryNotFound(i64),

    // 业务冲突
    #[error("名称冲突: {0}")]
    Conflict(String),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("存储错误: {0}")]
    Storage(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AdminError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,

            Self::SubcategoryNotFound(_) | Self::ParentNotFound(_) | Self::CategoryNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            Self::Conflict(_) => StatusCode::CONFLICT,

            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SubcategoryNotFound(_) => "SUBCATEGORY_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Storage(e) => {
                tracing::error!(error = %e, "存储操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 请求体无法解析为 JSON 或字段类型不符
impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 查询参数无法解析
impl From<QueryRejection> for AdminError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 路径参数无法解析
impl From<PathRejection> for AdminError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 从层级服务的错误转换
impl From<HierarchyError> for AdminError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::SubcategoryNotFound(id) => Self::SubcategoryNotFound(id),
            HierarchyError::ParentNotFound(id) => Self::ParentNotFound(id),
            HierarchyError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            HierarchyError::Validation(msg) => Self::Validation(msg),
            HierarchyError::Conflict(msg) => Self::Conflict(msg),
            HierarchyError::Database(e) => Self::Database(e),
            HierarchyError::Storage(msg) => Self::Storage(msg),
            HierarchyError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, AdminError>;
