//! 商品目录管理后台服务
//!
//! 提供子分类层级的 REST API。
//!
//! ## 核心功能
//!
//! - **子分类管理**：创建、更新、删除、启用/推荐状态、同级排序
//! - **层级调整**：改挂父节点、跨分类迁移，子树层级自动级联
//! - **树查询**：子节点、后代、面包屑、分类完整树
//! - **商品关联**：商品计数（可含后代）、删除前解绑商品
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型定义
//! - `extract`: 自定义提取器（操作人、带校验的 JSON）
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 审计日志、安全响应头
//! - `routes`: 路由与应用组装
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase，请求体同时接受 snake_case)

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use dto::{
    ApiResponse, CreateSubcategoryRequest, PageResponse, PaginationParams,
    SubcategoryQueryFilter, UpdateSubcategoryRequest,
};
pub use error::{AdminError, Result};
pub use state::AppState;
