//! 仓储 Trait 定义
//!
//! 服务层只依赖这些接口；PostgreSQL 与内存实现各自满足相同语义，测试中使用 mock。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CategorySummary, NewSubcategory, SubcategoryFilter, SubcategoryNode, SubcategoryPatch,
    SubtreeMove,
};

/// 子分类节点存储接口
///
/// 所有列表操作按 `display_order`、主语言名称、`id` 升序返回。
/// 存储层不校验层级不变量，由变更服务在写入前保证。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubcategoryRepositoryTrait: Send + Sync {
    /// 分配新 ID 并原样持久化
    async fn create(&self, node: &NewSubcategory) -> Result<SubcategoryNode>;
    async fn get_by_id(&self, id: i64) -> Result<Option<SubcategoryNode>>;
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<SubcategoryNode>>;

    /// 稀疏更新，节点不存在时返回 `SubcategoryNotFound`
    async fn update(&self, id: i64, patch: &SubcategoryPatch) -> Result<SubcategoryNode>;

    /// 节点不存在时返回 `SubcategoryNotFound`
    async fn delete(&self, id: i64) -> Result<()>;

    async fn list_by_parent(&self, parent_id: i64) -> Result<Vec<SubcategoryNode>>;

    /// 一次取回多个父节点的全部直接子节点（每层一次往返）
    async fn list_by_parents(&self, parent_ids: &[i64]) -> Result<Vec<SubcategoryNode>>;
    async fn list_roots_by_category(&self, category_id: i64) -> Result<Vec<SubcategoryNode>>;

    /// 分类内是否已有同名节点（主语言，忽略大小写与首尾空白）
    async fn name_exists(&self, name: &str, category_id: i64, exclude_id: Option<i64>)
    -> Result<bool>;
    async fn count_children(&self, parent_id: i64) -> Result<i64>;

    /// 写入子树移动：改写节点父级，并为子树内每个节点写入新层级与分类
    async fn apply_subtree_move(&self, mv: &SubtreeMove) -> Result<()>;

    /// 分页列表，返回 (当前页, 总数)
    async fn list(
        &self,
        filter: &SubcategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<SubcategoryNode>, i64)>;
}

/// 顶级分类查询接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryLookup: Send + Sync {
    async fn get_category(&self, id: i64) -> Result<Option<CategorySummary>>;

    async fn category_exists(&self, id: i64) -> Result<bool> {
        Ok(self.get_category(id).await?.is_some())
    }
}

/// 商品与子分类关联接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductAssociation: Send + Sync {
    async fn count_by_subcategory(&self, subcategory_id: i64) -> Result<i64>;
    async fn count_by_subcategories(&self, subcategory_ids: &[i64]) -> Result<i64>;

    /// 将指向 `subcategory_id` 的商品改挂到 `to`（None 表示解除关联），返回受影响数量
    async fn reassign_subcategory(&self, subcategory_id: i64, to: Option<i64>) -> Result<u64>;
}

/// 图片存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// 按引用删除图片，返回文件是否存在
    async fn delete_image(&self, reference: &str) -> Result<bool>;
}
