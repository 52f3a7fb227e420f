//! 商品关联桥接
//!
//! 子树维度的商品统计，以及删除前把商品从子分类上解绑。

use std::sync::Arc;

use tracing::{info, instrument};

use super::navigator::SubcategoryNavigator;
use crate::error::Result;
use crate::repository::ProductAssociation;

#[derive(Clone)]
pub struct ProductAssociationBridge {
    products: Arc<dyn ProductAssociation>,
    navigator: SubcategoryNavigator,
}

impl ProductAssociationBridge {
    pub fn new(products: Arc<dyn ProductAssociation>, navigator: SubcategoryNavigator) -> Self {
        Self {
            products,
            navigator,
        }
    }

    /// 直接挂在该节点上的商品数
    pub async fn get_product_count(&self, node_id: i64) -> Result<i64> {
        self.products.count_by_subcategory(node_id).await
    }

    /// 节点及其全部后代上的商品数
    #[instrument(skip(self))]
    pub async fn get_product_count_including_descendants(&self, node_id: i64) -> Result<i64> {
        let ids = self.navigator.get_descendant_ids(node_id).await?;
        self.products.count_by_subcategories(&ids).await
    }

    /// 清除指向该节点的商品关联（不影响后代节点上的商品），返回清除数量
    #[instrument(skip(self), fields(actor_id = ?actor_id))]
    pub async fn reassign_products_to_null(
        &self,
        node_id: i64,
        actor_id: Option<i64>,
    ) -> Result<u64> {
        let released = self.products.reassign_subcategory(node_id, None).await?;
        info!(node_id, released, "商品已解除子分类关联");
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalizedText, SubcategoryNode};
    use crate::repository::{
        MockCategoryLookup, MockProductAssociation, MockSubcategoryRepositoryTrait,
    };
    use chrono::Utc;
    use mockall::predicate::*;

    fn node(id: i64, parent_id: Option<i64>) -> SubcategoryNode {
        let now = Utc::now();
        SubcategoryNode {
            id,
            category_id: 1,
            parent_id,
            level: 1,
            name: LocalizedText::new(format!("n{id}"), None),
            description: None,
            display_order: 0,
            is_active: true,
            is_featured: false,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_count_including_descendants_uses_subtree_ids() {
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(node(id, None))));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![1])
            .returning(|_| Ok(vec![node(2, Some(1)), node(3, Some(1))]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![2, 3])
            .returning(|_| Ok(vec![]));

        let mut products = MockProductAssociation::new();
        products
            .expect_count_by_subcategories()
            .withf(|ids| ids.to_vec() == vec![1, 2, 3])
            .returning(|_| Ok(12));
        products
            .expect_count_by_subcategory()
            .with(eq(1))
            .returning(|_| Ok(4));

        let navigator = SubcategoryNavigator::new(Arc::new(repo), Arc::new(MockCategoryLookup::new()));
        let bridge = ProductAssociationBridge::new(Arc::new(products), navigator);

        assert_eq!(bridge.get_product_count(1).await.unwrap(), 4);
        assert_eq!(bridge.get_product_count_including_descendants(1).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_reassign_only_targets_node() {
        let mut products = MockProductAssociation::new();
        products
            .expect_reassign_subcategory()
            .with(eq(5), eq(None))
            .times(1)
            .returning(|_, _| Ok(2));

        let navigator = SubcategoryNavigator::new(
            Arc::new(MockSubcategoryRepositoryTrait::new()),
            Arc::new(MockCategoryLookup::new()),
        );
        let bridge = ProductAssociationBridge::new(Arc::new(products), navigator);
        assert_eq!(bridge.reassign_products_to_null(5, Some(1)).await.unwrap(), 2);
    }
}
