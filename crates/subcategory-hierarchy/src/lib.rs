//! 子分类层级服务
//!
//! 子分类在同一顶级分类内构成自引用树：每个节点可以挂在另一个子分类之下，
//! 并维护深度 `level`（根节点为 1）。
//!
//! ## 核心功能
//!
//! - **节点存储**：子分类的持久化、稀疏更新、按父节点/分类列举、分类内重名检查
//! - **树导航**：直接子节点、根节点、完整嵌套树、面包屑、带深度的后代集合
//! - **层级变更**：创建时计算层级、带环检测的改挂父节点、子树层级级联、跨分类迁移、删除前置检查
//! - **商品关联**：节点及其子树的商品计数，删除前的商品解绑钩子
//! - **展示映射**：按语言解析名称/描述，输出扁平或嵌套的 API 结构
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 存储接口及 PostgreSQL / 内存实现，外部协作方接口
//! - `service`: 导航、变更、商品关联服务
//! - `presentation`: 展示映射

pub mod error;
pub mod models;
pub mod presentation;
pub mod repository;
pub mod service;

pub use error::{HierarchyError, Result};
pub use models::*;
pub use repository::{
    CategoryLookup, ImageStorage, LocalImageStorage, MemoryCatalog, MemoryImageStorage,
    MemorySubcategoryRepository, PgCategoryLookup, PgProductAssociation, PgSubcategoryRepository,
    ProductAssociation, SubcategoryRepositoryTrait,
};
pub use service::{
    CreateSubcategory, HierarchyMutator, HierarchyServices, ProductAssociationBridge,
    SubcategoryNavigator, UpdateSubcategory,
};
