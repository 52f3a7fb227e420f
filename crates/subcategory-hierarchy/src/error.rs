//! 子分类层级错误类型
//!
//! 业务错误分三类：资源不存在、校验失败、名称冲突；其余均为透传的系统错误。

use thiserror::Error;

/// 层级服务错误类型
#[derive(Debug, Error)]
pub enum HierarchyError {
    // === 资源不存在 ===
    #[error("子分类不存在: {0}")]
    SubcategoryNotFound(i64),

    #[error("父级子分类不存在: {0}")]
    ParentNotFound(i64),

    #[error("分类不存在: {0}")]
    CategoryNotFound(i64),

    // === 业务校验 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("名称冲突: {0}")]
    Conflict(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 层级服务 Result 类型别名
pub type Result<T> = std::result::Result<T, HierarchyError>;

impl HierarchyError {
    /// 是否为“引用的节点/分类不存在”
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SubcategoryNotFound(_) | Self::ParentNotFound(_) | Self::CategoryNotFound(_)
        )
    }

    /// 检查是否为业务错误（调用方需要分支处理的预期结果）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应和指标标签）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SubcategoryNotFound(_) => "SUBCATEGORY_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
