//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use catalog_shared::database::Database;
use subcategory_hierarchy::{
    HierarchyMutator, HierarchyServices, Locale, MemoryCatalog, MemoryImageStorage,
    MemorySubcategoryRepository, ProductAssociationBridge, SubcategoryNavigator,
};

/// Axum 应用共享状态
///
/// 层级服务通过 Arc 在 handler 间共享；内存模式下没有数据库连接。
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<HierarchyServices>,
    pub database: Option<Database>,
    /// 请求未指定 locale 时使用
    pub default_locale: Locale,
}

impl AppState {
    pub fn new(
        services: HierarchyServices,
        database: Option<Database>,
        default_locale: Locale,
    ) -> Self {
        Self {
            services: Arc::new(services),
            database,
            default_locale,
        }
    }

    /// 基于内存存储构建，分类与商品由调用方预置
    pub fn in_memory(
        catalog: Arc<MemoryCatalog>,
        images: Arc<MemoryImageStorage>,
        default_locale: Locale,
    ) -> Self {
        let services = HierarchyServices::new(
            Arc::new(MemorySubcategoryRepository::new()),
            catalog.clone(),
            catalog,
            images,
        );
        Self::new(services, None, default_locale)
    }

    pub fn navigator(&self) -> &SubcategoryNavigator {
        &self.services.navigator
    }

    pub fn mutator(&self) -> &HierarchyMutator {
        &self.services.mutator
    }

    pub fn products(&self) -> &ProductAssociationBridge {
        &self.services.products
    }
}
