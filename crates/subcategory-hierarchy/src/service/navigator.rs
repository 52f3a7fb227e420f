//! 树导航服务（只读）
//!
//! 所有遍历都按层进行：每一层只做一次 `list_by_parents` 往返，
//! 并用已访问集合防止损坏数据中的环导致死循环。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use catalog_shared::observability::metrics;

use crate::error::{HierarchyError, Result};
use crate::models::{
    Breadcrumb, CategorySummary, DescendantNode, SubcategoryFilter, SubcategoryNode, TreeNode,
};
use crate::repository::{CategoryLookup, SubcategoryRepositoryTrait};

/// 子分类树导航
#[derive(Clone)]
pub struct SubcategoryNavigator {
    repo: Arc<dyn SubcategoryRepositoryTrait>,
    categories: Arc<dyn CategoryLookup>,
}

impl SubcategoryNavigator {
    pub fn new(
        repo: Arc<dyn SubcategoryRepositoryTrait>,
        categories: Arc<dyn CategoryLookup>,
    ) -> Self {
        Self { repo, categories }
    }

    /// 获取单个节点，不存在返回 `SubcategoryNotFound`
    pub async fn get_node(&self, id: i64) -> Result<SubcategoryNode> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(HierarchyError::SubcategoryNotFound(id))
    }

    /// 直接子节点，按 display_order、名称排序
    pub async fn get_children(&self, parent_id: i64) -> Result<Vec<SubcategoryNode>> {
        self.repo.list_by_parent(parent_id).await
    }

    /// 顶级分类摘要，不存在返回 `CategoryNotFound`
    pub async fn get_category(&self, category_id: i64) -> Result<CategorySummary> {
        self.categories
            .get_category(category_id)
            .await?
            .ok_or(HierarchyError::CategoryNotFound(category_id))
    }

    /// 按条件分页查询，返回 (当前页, 总数)
    pub async fn search(
        &self,
        filter: &SubcategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<SubcategoryNode>, i64)> {
        self.repo.list(filter, limit, offset).await
    }

    /// 分类下的根节点
    pub async fn get_roots(&self, category_id: i64) -> Result<Vec<SubcategoryNode>> {
        self.repo.list_roots_by_category(category_id).await
    }

    /// 分类的完整嵌套树
    #[instrument(skip(self))]
    pub async fn get_nested_tree(&self, category_id: i64) -> Result<Vec<TreeNode>> {
        let roots = self.repo.list_roots_by_category(category_id).await?;
        let mut round_trips = 1;

        let mut visited: HashSet<i64> = roots.iter().map(|n| n.id).collect();
        let mut children_of: HashMap<i64, Vec<SubcategoryNode>> = HashMap::new();
        let mut frontier: Vec<i64> = roots.iter().map(|n| n.id).collect();

        while !frontier.is_empty() {
            let level = self.repo.list_by_parents(&frontier).await?;
            round_trips += 1;

            frontier = Vec::with_capacity(level.len());
            for child in level {
                if !visited.insert(child.id) {
                    warn!(node_id = child.id, "检测到子分类环，已跳过重复节点");
                    continue;
                }
                frontier.push(child.id);
                if let Some(parent_id) = child.parent_id {
                    children_of.entry(parent_id).or_default().push(child);
                }
            }
        }

        metrics::record_traversal("nested_tree", round_trips);
        debug!(category_id, nodes = visited.len(), round_trips, "Nested tree loaded");

        Ok(roots
            .into_iter()
            .map(|root| assemble(root, &mut children_of))
            .collect())
    }

    /// 面包屑：分类（level 0）在前，随后从根到节点自身
    ///
    /// 父引用悬空或出现环时提前停止，不报错。
    #[instrument(skip(self))]
    pub async fn get_parent_chain(&self, node_id: i64) -> Result<Vec<Breadcrumb>> {
        let node = self.get_node(node_id).await?;
        let category_id = node.category_id;

        let mut visited = HashSet::from([node.id]);
        let mut next_parent = node.parent_id;
        let mut chain = vec![node];

        while let Some(parent_id) = next_parent {
            if !visited.insert(parent_id) {
                warn!(node_id, parent_id, "祖先链存在环，提前结束");
                break;
            }
            match self.repo.get_by_id(parent_id).await? {
                Some(parent) => {
                    next_parent = parent.parent_id;
                    chain.push(parent);
                }
                None => {
                    warn!(node_id, parent_id, "父级引用悬空，提前结束");
                    break;
                }
            }
        }
        metrics::record_traversal("parent_chain", chain.len());

        let mut crumbs = Vec::with_capacity(chain.len() + 1);
        match self.categories.get_category(category_id).await? {
            Some(category) => crumbs.push(Breadcrumb::category(&category)),
            None => warn!(node_id, category_id, "所属分类不存在，面包屑省略分类"),
        }
        crumbs.extend(chain.iter().rev().map(Breadcrumb::subcategory));

        Ok(crumbs)
    }

    /// 全部后代，附带相对深度（直接子节点为 1），按层序返回
    pub async fn get_descendants(&self, node_id: i64) -> Result<Vec<DescendantNode>> {
        self.get_node(node_id).await?;
        self.walk_descendants(node_id).await
    }

    /// `[node_id]` 加上全部后代 ID
    pub async fn get_descendant_ids(&self, node_id: i64) -> Result<Vec<i64>> {
        let descendants = self.get_descendants(node_id).await?;
        let mut ids = Vec::with_capacity(descendants.len() + 1);
        ids.push(node_id);
        ids.extend(descendants.iter().map(|d| d.node.id));
        Ok(ids)
    }

    /// 不检查起点是否存在的后代遍历，供变更服务在已取到节点后使用
    #[instrument(skip(self))]
    pub(crate) async fn walk_descendants(&self, node_id: i64) -> Result<Vec<DescendantNode>> {
        let mut visited = HashSet::from([node_id]);
        let mut frontier = vec![node_id];
        let mut descendants = Vec::new();
        let mut depth = 0;
        let mut round_trips = 0;

        while !frontier.is_empty() {
            depth += 1;
            let level = self.repo.list_by_parents(&frontier).await?;
            round_trips += 1;

            frontier = Vec::with_capacity(level.len());
            for child in level {
                if !visited.insert(child.id) {
                    warn!(node_id, child_id = child.id, "检测到子分类环，已跳过重复节点");
                    continue;
                }
                frontier.push(child.id);
                descendants.push(DescendantNode { node: child, depth });
            }
        }

        metrics::record_traversal("descendants", round_trips);
        Ok(descendants)
    }
}

fn assemble(node: SubcategoryNode, children_of: &mut HashMap<i64, Vec<SubcategoryNode>>) -> TreeNode {
    let children = children_of
        .remove(&node.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, children_of))
        .collect();
    TreeNode { node, children }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BreadcrumbKind, CategorySummary, LocalizedText};
    use crate::repository::{MockCategoryLookup, MockSubcategoryRepositoryTrait};
    use chrono::Utc;
    use mockall::predicate::*;

    fn node(id: i64, parent_id: Option<i64>, level: i32) -> SubcategoryNode {
        let now = Utc::now();
        SubcategoryNode {
            id,
            category_id: 1,
            parent_id,
            level,
            name: LocalizedText::new(format!("node-{id}"), None),
            description: None,
            display_order: 0,
            is_active: true,
            is_featured: false,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn navigator(
        repo: MockSubcategoryRepositoryTrait,
        categories: MockCategoryLookup,
    ) -> SubcategoryNavigator {
        SubcategoryNavigator::new(Arc::new(repo), Arc::new(categories))
    }

    #[tokio::test]
    async fn test_descendants_one_round_trip_per_level() {
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_get_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(node(1, None, 1))));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![1])
            .times(1)
            .returning(|_| Ok(vec![node(2, Some(1), 2), node(3, Some(1), 2)]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![2, 3])
            .times(1)
            .returning(|_| Ok(vec![node(4, Some(3), 3)]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![4])
            .times(1)
            .returning(|_| Ok(vec![]));

        let nav = navigator(repo, MockCategoryLookup::new());
        let descendants = nav.get_descendants(1).await.unwrap();
        let pairs: Vec<(i64, i32)> = descendants.iter().map(|d| (d.node.id, d.depth)).collect();
        assert_eq!(pairs, vec![(2, 1), (3, 1), (4, 2)]);
    }

    #[tokio::test]
    async fn test_descendants_of_missing_node() {
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        let nav = navigator(repo, MockCategoryLookup::new());

        let err = nav.get_descendants(9).await.unwrap_err();
        assert!(matches!(err, HierarchyError::SubcategoryNotFound(9)));
    }

    #[tokio::test]
    async fn test_walk_stops_on_cycle() {
        // 损坏数据：2 的子节点又指回 1
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![1])
            .returning(|_| Ok(vec![node(2, Some(1), 2)]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![2])
            .returning(|_| Ok(vec![node(1, Some(2), 3)]));

        let nav = navigator(repo, MockCategoryLookup::new());
        let descendants = nav.walk_descendants(1).await.unwrap();
        assert_eq!(descendants.len(), 1);
        assert_eq!(descendants[0].node.id, 2);
    }

    #[tokio::test]
    async fn test_parent_chain_with_category_prefix() {
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_get_by_id()
            .with(eq(3))
            .returning(|_| Ok(Some(node(3, Some(2), 3))));
        repo.expect_get_by_id()
            .with(eq(2))
            .returning(|_| Ok(Some(node(2, Some(1), 2))));
        repo.expect_get_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(node(1, None, 1))));

        let mut categories = MockCategoryLookup::new();
        categories.expect_get_category().with(eq(1)).returning(|id| {
            Ok(Some(CategorySummary {
                id,
                name: LocalizedText::new("Catalog", None),
            }))
        });

        let nav = navigator(repo, categories);
        let chain = nav.get_parent_chain(3).await.unwrap();

        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0].kind, BreadcrumbKind::Category);
        assert_eq!(chain[0].level, 0);
        let ids: Vec<i64> = chain[1..].iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_parent_chain_stops_at_dangling_parent() {
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_get_by_id()
            .with(eq(3))
            .returning(|_| Ok(Some(node(3, Some(2), 3))));
        repo.expect_get_by_id().with(eq(2)).returning(|_| Ok(None));

        let mut categories = MockCategoryLookup::new();
        categories.expect_get_category().returning(|_| Ok(None));

        let nav = navigator(repo, categories);
        let chain = nav.get_parent_chain(3).await.unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].id, 3);
        assert_eq!(chain[0].kind, BreadcrumbKind::Subcategory);
    }

    #[tokio::test]
    async fn test_nested_tree_assembly() {
        let mut repo = MockSubcategoryRepositoryTrait::new();
        repo.expect_list_roots_by_category()
            .with(eq(1))
            .returning(|_| Ok(vec![node(1, None, 1), node(5, None, 1)]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![1, 5])
            .returning(|_| Ok(vec![node(2, Some(1), 2), node(6, Some(5), 2)]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![2, 6])
            .returning(|_| Ok(vec![node(3, Some(2), 3)]));
        repo.expect_list_by_parents()
            .withf(|ids| ids.to_vec() == vec![3])
            .returning(|_| Ok(vec![]));

        let nav = navigator(repo, MockCategoryLookup::new());
        let tree = nav.get_nested_tree(1).await.unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].node.id, 1);
        assert_eq!(tree[0].children[0].node.id, 2);
        assert_eq!(tree[0].children[0].children[0].node.id, 3);
        assert_eq!(tree[1].children.len(), 1);
        assert_eq!(tree.iter().map(TreeNode::size).sum::<usize>(), 5);
    }

    #[tokio::test]
    async fn test_get_category_missing() {
        let mut categories = MockCategoryLookup::new();
        categories
            .expect_get_category()
            .with(eq(42))
            .returning(|_| Ok(None));

        let nav = navigator(MockSubcategoryRepositoryTrait::new(), categories);
        let err = nav.get_category(42).await.unwrap_err();
        assert!(matches!(err, HierarchyError::CategoryNotFound(42)));
    }
}
