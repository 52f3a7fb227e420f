//! 服务层
//!
//! - `navigator`: 树导航（只读）
//! - `mutator`: 层级变更
//! - `product_bridge`: 商品关联
//! - `dto`: 变更服务输入

pub mod dto;
pub mod mutator;
pub mod navigator;
pub mod product_bridge;

use std::sync::Arc;

pub use dto::{CreateSubcategory, UpdateSubcategory};
pub use mutator::HierarchyMutator;
pub use navigator::SubcategoryNavigator;
pub use product_bridge::ProductAssociationBridge;

use crate::repository::{
    CategoryLookup, ImageStorage, ProductAssociation, SubcategoryRepositoryTrait,
};

/// 层级服务集合，共享同一组存储与协作方
#[derive(Clone)]
pub struct HierarchyServices {
    pub navigator: SubcategoryNavigator,
    pub mutator: HierarchyMutator,
    pub products: ProductAssociationBridge,
}

impl HierarchyServices {
    pub fn new(
        repo: Arc<dyn SubcategoryRepositoryTrait>,
        categories: Arc<dyn CategoryLookup>,
        products: Arc<dyn ProductAssociation>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        let navigator = SubcategoryNavigator::new(repo.clone(), categories.clone());
        let mutator = HierarchyMutator::new(
            repo,
            categories,
            products.clone(),
            images,
            navigator.clone(),
        );
        let products = ProductAssociationBridge::new(products, navigator.clone());

        Self {
            navigator,
            mutator,
            products,
        }
    }
}
