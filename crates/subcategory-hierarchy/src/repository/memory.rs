//! 内存实现
//!
//! 使用 DashMap 存储，语义与 PostgreSQL 实现保持一致。
//! 用于集成测试以及 `storage.backend = "memory"` 的本地演示模式，重启即丢失。

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};

use super::traits::{CategoryLookup, ImageStorage, ProductAssociation, SubcategoryRepositoryTrait};
use crate::error::{HierarchyError, Result};
use crate::models::locale::normalize_name;
use crate::models::{
    CategorySummary, LocalizedText, NewSubcategory, SubcategoryFilter, SubcategoryNode,
    SubcategoryPatch, SubtreeMove,
};

/// 内存子分类仓储
#[derive(Debug, Default)]
pub struct MemorySubcategoryRepository {
    nodes: Arc<DashMap<i64, SubcategoryNode>>,
    next_id: AtomicI64,
}

impl MemorySubcategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前节点数量
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 直接写入一个节点（测试中用于构造损坏数据）
    pub fn insert_raw(&self, node: SubcategoryNode) {
        self.next_id.fetch_max(node.id, Ordering::SeqCst);
        self.nodes.insert(node.id, node);
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<SubcategoryNode>
    where
        F: Fn(&SubcategoryNode) -> bool,
    {
        let mut nodes: Vec<SubcategoryNode> = self
            .nodes
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        nodes.sort_by(SubcategoryNode::sibling_cmp);
        nodes
    }
}

#[async_trait]
impl SubcategoryRepositoryTrait for MemorySubcategoryRepository {
    async fn create(&self, node: &NewSubcategory) -> Result<SubcategoryNode> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let created = SubcategoryNode {
            id,
            category_id: node.category_id,
            parent_id: node.parent_id,
            level: node.level,
            name: node.name.clone(),
            description: node.description.clone(),
            display_order: node.display_order,
            is_active: node.is_active,
            is_featured: node.is_featured,
            image: node.image.clone(),
            created_at: now,
            updated_at: now,
        };
        self.nodes.insert(id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SubcategoryNode>> {
        Ok(self.nodes.get(&id).map(|n| n.clone()))
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<SubcategoryNode>> {
        let mut nodes: Vec<SubcategoryNode> = ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| self.nodes.get(id).map(|n| n.clone()))
            .collect();
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    async fn update(&self, id: i64, patch: &SubcategoryPatch) -> Result<SubcategoryNode> {
        let mut entry = self
            .nodes
            .get_mut(&id)
            .ok_or(HierarchyError::SubcategoryNotFound(id))?;
        let node = entry.value_mut();

        if let Some(name) = &patch.name {
            node.name = name.clone();
        }
        if let Some(description) = &patch.description {
            node.description = description.clone();
        }
        if let Some(order) = patch.display_order {
            node.display_order = order;
        }
        if let Some(active) = patch.is_active {
            node.is_active = active;
        }
        if let Some(featured) = patch.is_featured {
            node.is_featured = featured;
        }
        if let Some(image) = &patch.image {
            node.image = image.clone();
        }
        node.updated_at = Utc::now();

        Ok(node.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.nodes
            .remove(&id)
            .map(|_| ())
            .ok_or(HierarchyError::SubcategoryNotFound(id))
    }

    async fn list_by_parent(&self, parent_id: i64) -> Result<Vec<SubcategoryNode>> {
        Ok(self.collect_sorted(|n| n.parent_id == Some(parent_id)))
    }

    async fn list_by_parents(&self, parent_ids: &[i64]) -> Result<Vec<SubcategoryNode>> {
        let parents: HashSet<i64> = parent_ids.iter().copied().collect();
        Ok(self.collect_sorted(|n| n.parent_id.is_some_and(|p| parents.contains(&p))))
    }

    async fn list_roots_by_category(&self, category_id: i64) -> Result<Vec<SubcategoryNode>> {
        Ok(self.collect_sorted(|n| n.category_id == category_id && n.is_root()))
    }

    async fn name_exists(
        &self,
        name: &str,
        category_id: i64,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let wanted = normalize_name(name);
        Ok(self.nodes.iter().any(|entry| {
            let n = entry.value();
            n.category_id == category_id
                && Some(n.id) != exclude_id
                && normalize_name(&n.name.en) == wanted
        }))
    }

    async fn count_children(&self, parent_id: i64) -> Result<i64> {
        let count = self
            .nodes
            .iter()
            .filter(|entry| entry.value().parent_id == Some(parent_id))
            .count();
        Ok(count as i64)
    }

    async fn apply_subtree_move(&self, mv: &SubtreeMove) -> Result<()> {
        if !self.nodes.contains_key(&mv.node_id) {
            return Err(HierarchyError::SubcategoryNotFound(mv.node_id));
        }

        let now = Utc::now();
        if let Some(mut node) = self.nodes.get_mut(&mv.node_id) {
            node.parent_id = mv.new_parent_id;
            node.updated_at = now;
        }
        for assignment in &mv.levels {
            if let Some(mut node) = self.nodes.get_mut(&assignment.id) {
                node.level = assignment.level;
                node.category_id = mv.category_id;
                node.updated_at = now;
            }
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &SubcategoryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<SubcategoryNode>, i64)> {
        let mut matched: Vec<SubcategoryNode> = self
            .nodes
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| {
            a.category_id
                .cmp(&b.category_id)
                .then_with(|| a.level.cmp(&b.level))
                .then_with(|| a.sibling_cmp(b))
        });

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

/// 内存分类与商品目录
///
/// 同时充当 [`CategoryLookup`] 和 [`ProductAssociation`]。
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    categories: DashMap<i64, CategorySummary>,
    /// product_id -> subcategory_id
    products: DashMap<i64, Option<i64>>,
    next_product_id: AtomicI64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, id: i64, name_en: &str, name_ar: Option<&str>) {
        self.categories.insert(
            id,
            CategorySummary {
                id,
                name: LocalizedText::new(name_en, name_ar.map(str::to_string)),
            },
        );
    }

    /// 新增一个挂在 `subcategory_id` 下的商品，返回商品 ID
    pub fn assign_product(&self, subcategory_id: i64) -> i64 {
        let id = self.next_product_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.products.insert(id, Some(subcategory_id));
        id
    }

    pub fn product_subcategory(&self, product_id: i64) -> Option<i64> {
        self.products.get(&product_id).and_then(|p| *p)
    }
}

#[async_trait]
impl CategoryLookup for MemoryCatalog {
    async fn get_category(&self, id: i64) -> Result<Option<CategorySummary>> {
        Ok(self.categories.get(&id).map(|c| c.clone()))
    }
}

#[async_trait]
impl ProductAssociation for MemoryCatalog {
    async fn count_by_subcategory(&self, subcategory_id: i64) -> Result<i64> {
        self.count_by_subcategories(&[subcategory_id]).await
    }

    async fn count_by_subcategories(&self, subcategory_ids: &[i64]) -> Result<i64> {
        let wanted: HashSet<i64> = subcategory_ids.iter().copied().collect();
        let count = self
            .products
            .iter()
            .filter(|entry| entry.value().is_some_and(|s| wanted.contains(&s)))
            .count();
        Ok(count as i64)
    }

    async fn reassign_subcategory(&self, subcategory_id: i64, to: Option<i64>) -> Result<u64> {
        let mut changed = 0u64;
        for mut entry in self.products.iter_mut() {
            if *entry.value() == Some(subcategory_id) {
                *entry.value_mut() = to;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

/// 内存图片存储，记录被删除的引用
#[derive(Debug, Default)]
pub struct MemoryImageStorage {
    images: DashSet<String>,
    deleted: DashSet<String>,
    fail: AtomicBool,
}

impl MemoryImageStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, reference: &str) {
        self.images.insert(reference.to_string());
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.images.contains(reference)
    }

    pub fn was_deleted(&self, reference: &str) -> bool {
        self.deleted.contains(reference)
    }

    /// 让后续删除全部失败（模拟存储故障）
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn delete_image(&self, reference: &str) -> Result<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HierarchyError::Storage(format!(
                "image backend unavailable: {reference}"
            )));
        }
        self.deleted.insert(reference.to_string());
        Ok(self.images.remove(reference).is_some())
    }
}
