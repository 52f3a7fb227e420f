//! 数据访问层
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - PostgreSQL 实现用于生产，内存实现用于测试与本地演示
//! - 外部协作方（分类、商品、图片）同样以 trait 暴露

mod collaborators;
mod memory;
mod subcategory_repo;
mod traits;

pub use collaborators::{LocalImageStorage, PgCategoryLookup, PgProductAssociation};
pub use memory::{MemoryCatalog, MemoryImageStorage, MemorySubcategoryRepository};
pub use subcategory_repo::PgSubcategoryRepository;
pub use traits::*;
