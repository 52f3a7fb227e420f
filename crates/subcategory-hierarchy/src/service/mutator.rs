//! 层级变更服务
//!
//! 写入前校验全部层级不变量：
//! - 父节点存在且与子节点同属一个分类
//! - 根节点 level = 1，其余 level = 父节点 level + 1
//! - 不允许挂到自身或自身后代之下
//! - 分类内主语言名称唯一
//! - 仍有商品或子节点的节点不允许删除
//!
//! ## 子树迁移流程
//!
//! 1. 校验目标 -> 2. 迁移前计算后代及深度 -> 3. 目标分类重名检查 -> 4. 一次性写入整棵子树的新层级

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use catalog_shared::observability::metrics;

use super::dto::{CreateSubcategory, UpdateSubcategory, trimmed};
use super::navigator::SubcategoryNavigator;
use crate::error::{HierarchyError, Result};
use crate::models::{
    LevelAssignment, LocalizedText, SubcategoryNode, SubcategoryPatch, SubtreeMove,
};
use crate::repository::{
    CategoryLookup, ImageStorage, ProductAssociation, SubcategoryRepositoryTrait,
};

/// 层级变更服务
#[derive(Clone)]
pub struct HierarchyMutator {
    repo: Arc<dyn SubcategoryRepositoryTrait>,
    categories: Arc<dyn CategoryLookup>,
    products: Arc<dyn ProductAssociation>,
    images: Arc<dyn ImageStorage>,
    navigator: SubcategoryNavigator,
}

impl HierarchyMutator {
    pub fn new(
        repo: Arc<dyn SubcategoryRepositoryTrait>,
        categories: Arc<dyn CategoryLookup>,
        products: Arc<dyn ProductAssociation>,
        images: Arc<dyn ImageStorage>,
        navigator: SubcategoryNavigator,
    ) -> Self {
        Self {
            repo,
            categories,
            products,
            images,
            navigator,
        }
    }

    /// 创建子分类
    ///
    /// 1. 分类必须存在
    /// 2. 指定父节点时：父节点必须存在且同属该分类，level = 父 level + 1；否则 level = 1
    /// 3. 分类内名称唯一
    #[instrument(skip(self, input), fields(category_id = input.category_id, parent_id = ?input.parent_id, actor_id = ?actor_id))]
    pub async fn create_node(
        &self,
        input: CreateSubcategory,
        actor_id: Option<i64>,
    ) -> Result<SubcategoryNode> {
        let start = Instant::now();
        let result = self.do_create(input).await;
        observe("create", start, &result);

        if let Ok(node) = &result {
            info!(id = node.id, level = node.level, "子分类创建成功");
        }
        result
    }

    async fn do_create(&self, input: CreateSubcategory) -> Result<SubcategoryNode> {
        let name = input.name_en.trim();
        if name.is_empty() {
            return Err(HierarchyError::Validation("name is required".into()));
        }

        if !self.categories.category_exists(input.category_id).await? {
            return Err(HierarchyError::CategoryNotFound(input.category_id));
        }

        let level = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .repo
                    .get_by_id(parent_id)
                    .await?
                    .ok_or(HierarchyError::ParentNotFound(parent_id))?;
                if parent.category_id != input.category_id {
                    return Err(HierarchyError::Validation(format!(
                        "parent {} belongs to category {}, not {}",
                        parent_id, parent.category_id, input.category_id
                    )));
                }
                parent.level + 1
            }
            None => 1,
        };

        if self.repo.name_exists(name, input.category_id, None).await? {
            return Err(HierarchyError::Conflict(format!(
                "subcategory name '{}' already exists in category {}",
                name, input.category_id
            )));
        }

        self.repo.create(&input.into_new(level)).await
    }

    /// 更新名称、描述、排序、状态、图片
    ///
    /// 主语言名称变化时重新检查唯一性；图片被替换或清空时尽力删除旧图片。
    #[instrument(skip(self, input), fields(actor_id = ?actor_id))]
    pub async fn update_fields(
        &self,
        id: i64,
        input: UpdateSubcategory,
        actor_id: Option<i64>,
    ) -> Result<SubcategoryNode> {
        let start = Instant::now();
        let result = self.do_update(id, input).await;
        observe("update", start, &result);
        result
    }

    async fn do_update(&self, id: i64, input: UpdateSubcategory) -> Result<SubcategoryNode> {
        let current = self.navigator.get_node(id).await?;
        let patch = build_patch(&current, input)?;

        if patch.is_empty() {
            return Ok(current);
        }

        if let Some(name) = &patch.name {
            let renamed = name.primary_key() != current.name.primary_key();
            if renamed
                && self
                    .repo
                    .name_exists(&name.en, current.category_id, Some(id))
                    .await?
            {
                return Err(HierarchyError::Conflict(format!(
                    "subcategory name '{}' already exists in category {}",
                    name.en, current.category_id
                )));
            }
        }

        let updated = self.repo.update(id, &patch).await?;

        if let Some(old) = current.image.as_deref()
            && updated.image.as_deref() != Some(old)
        {
            self.delete_image_best_effort(id, old).await;
        }

        Ok(updated)
    }

    /// 改挂父节点（None 表示提升为根节点），整棵子树层级级联更新
    ///
    /// 分类随新父节点变化；跨分类时检查子树内所有名称在目标分类是否冲突。
    #[instrument(skip(self), fields(actor_id = ?actor_id))]
    pub async fn reparent(
        &self,
        id: i64,
        new_parent_id: Option<i64>,
        actor_id: Option<i64>,
    ) -> Result<SubcategoryNode> {
        let start = Instant::now();
        let result = self.do_reparent(id, new_parent_id).await;
        observe("reparent", start, &result);
        result
    }

    async fn do_reparent(&self, id: i64, new_parent_id: Option<i64>) -> Result<SubcategoryNode> {
        if new_parent_id == Some(id) {
            return Err(HierarchyError::Validation(
                "a subcategory cannot be its own parent".into(),
            ));
        }

        let node = self.navigator.get_node(id).await?;
        let new_parent = match new_parent_id {
            Some(parent_id) => Some(
                self.repo
                    .get_by_id(parent_id)
                    .await?
                    .ok_or(HierarchyError::ParentNotFound(parent_id))?,
            ),
            None => None,
        };

        // 迁移前计算后代，深度相对于被移动节点
        let descendants = self.navigator.walk_descendants(id).await?;
        if let Some(parent) = &new_parent
            && descendants.iter().any(|d| d.node.id == parent.id)
        {
            return Err(HierarchyError::Validation(format!(
                "cannot move subcategory {} under its own descendant {}",
                id, parent.id
            )));
        }

        if node.parent_id == new_parent_id {
            return Ok(node);
        }

        let (new_level, category_id) = match &new_parent {
            Some(parent) => (parent.level + 1, parent.category_id),
            None => (1, node.category_id),
        };

        if category_id != node.category_id {
            let names = std::iter::once(&node.name).chain(descendants.iter().map(|d| &d.node.name));
            self.ensure_names_free(names, category_id).await?;
        }

        let mut levels = Vec::with_capacity(descendants.len() + 1);
        levels.push(LevelAssignment { id, level: new_level });
        levels.extend(descendants.iter().map(|d| LevelAssignment {
            id: d.node.id,
            level: new_level + d.depth,
        }));

        self.apply_move(SubtreeMove {
            node_id: id,
            new_parent_id,
            category_id,
            levels,
        })
        .await
    }

    /// 迁移到另一个分类，节点成为目标分类的根节点
    #[instrument(skip(self), fields(actor_id = ?actor_id))]
    pub async fn move_to_category(
        &self,
        id: i64,
        new_category_id: i64,
        actor_id: Option<i64>,
    ) -> Result<SubcategoryNode> {
        let start = Instant::now();
        let result = self.do_move_to_category(id, new_category_id).await;
        observe("move_category", start, &result);
        result
    }

    async fn do_move_to_category(&self, id: i64, new_category_id: i64) -> Result<SubcategoryNode> {
        let node = self.navigator.get_node(id).await?;
        if node.category_id == new_category_id {
            return Err(HierarchyError::Validation(format!(
                "subcategory {} already belongs to category {}",
                id, new_category_id
            )));
        }
        if !self.categories.category_exists(new_category_id).await? {
            return Err(HierarchyError::CategoryNotFound(new_category_id));
        }

        let descendants = self.navigator.walk_descendants(id).await?;
        let names = std::iter::once(&node.name).chain(descendants.iter().map(|d| &d.node.name));
        self.ensure_names_free(names, new_category_id).await?;

        let mut levels = Vec::with_capacity(descendants.len() + 1);
        levels.push(LevelAssignment { id, level: 1 });
        levels.extend(descendants.iter().map(|d| LevelAssignment {
            id: d.node.id,
            level: 1 + d.depth,
        }));

        self.apply_move(SubtreeMove {
            node_id: id,
            new_parent_id: None,
            category_id: new_category_id,
            levels,
        })
        .await
    }

    /// 删除子分类
    ///
    /// 仍有商品直接引用、或仍有子节点时拒绝；删除后尽力清理图片。
    #[instrument(skip(self), fields(actor_id = ?actor_id))]
    pub async fn delete(&self, id: i64, actor_id: Option<i64>) -> Result<()> {
        let start = Instant::now();
        let result = self.do_delete(id).await;
        observe("delete", start, &result);

        if result.is_ok() {
            info!(id, "子分类已删除");
        }
        result
    }

    async fn do_delete(&self, id: i64) -> Result<()> {
        let node = self.navigator.get_node(id).await?;

        let products = self.products.count_by_subcategory(id).await?;
        if products > 0 {
            return Err(HierarchyError::Validation(format!(
                "subcategory {} has {} products; reassign them before deleting",
                id, products
            )));
        }

        let children = self.repo.count_children(id).await?;
        if children > 0 {
            return Err(HierarchyError::Validation(format!(
                "subcategory {} has {} children; move or delete them first",
                id, children
            )));
        }

        self.repo.delete(id).await?;

        if let Some(image) = node.image.as_deref() {
            self.delete_image_best_effort(id, image).await;
        }
        Ok(())
    }

    /// 切换启用/推荐状态
    #[instrument(skip(self), fields(actor_id = ?actor_id))]
    pub async fn set_status(
        &self,
        id: i64,
        is_active: Option<bool>,
        is_featured: Option<bool>,
        actor_id: Option<i64>,
    ) -> Result<SubcategoryNode> {
        let start = Instant::now();
        let result = async {
            if is_active.is_none() && is_featured.is_none() {
                return Err(HierarchyError::Validation(
                    "isActive or isFeatured is required".into(),
                ));
            }
            let patch = SubcategoryPatch {
                is_active,
                is_featured,
                ..Default::default()
            };
            self.repo.update(id, &patch).await
        }
        .await;
        observe("set_status", start, &result);
        result
    }

    /// 调整同级排序
    ///
    /// 所有节点必须存在且为同一父节点（或同一分类的根节点）下的兄弟节点。
    #[instrument(skip(self, items), fields(count = items.len(), actor_id = ?actor_id))]
    pub async fn reorder(
        &self,
        items: Vec<(i64, i32)>,
        actor_id: Option<i64>,
    ) -> Result<Vec<SubcategoryNode>> {
        let start = Instant::now();
        let result = self.do_reorder(items).await;
        observe("reorder", start, &result);
        result
    }

    async fn do_reorder(&self, items: Vec<(i64, i32)>) -> Result<Vec<SubcategoryNode>> {
        if items.is_empty() {
            return Err(HierarchyError::Validation("reorder list is empty".into()));
        }
        let mut seen = HashSet::with_capacity(items.len());
        if let Some((dup, _)) = items.iter().find(|(id, _)| !seen.insert(*id)) {
            return Err(HierarchyError::Validation(format!(
                "subcategory {} listed more than once",
                dup
            )));
        }

        let ids: Vec<i64> = items.iter().map(|(id, _)| *id).collect();
        let nodes = self.repo.get_by_ids(&ids).await?;
        if let Some(missing) = ids.iter().find(|id| !nodes.iter().any(|n| n.id == **id)) {
            return Err(HierarchyError::SubcategoryNotFound(*missing));
        }

        let first = &nodes[0];
        let siblings = nodes
            .iter()
            .all(|n| n.parent_id == first.parent_id && n.category_id == first.category_id);
        if !siblings {
            return Err(HierarchyError::Validation(
                "reordered subcategories must share the same parent".into(),
            ));
        }

        let mut updated = Vec::with_capacity(items.len());
        for (id, display_order) in items {
            let patch = SubcategoryPatch {
                display_order: Some(display_order),
                ..Default::default()
            };
            updated.push(self.repo.update(id, &patch).await?);
        }
        updated.sort_by(SubcategoryNode::sibling_cmp);
        Ok(updated)
    }

    async fn ensure_names_free<'a>(
        &self,
        names: impl Iterator<Item = &'a LocalizedText>,
        category_id: i64,
    ) -> Result<()> {
        for name in names {
            if self.repo.name_exists(&name.en, category_id, None).await? {
                return Err(HierarchyError::Conflict(format!(
                    "subcategory name '{}' already exists in category {}",
                    name.en, category_id
                )));
            }
        }
        Ok(())
    }

    async fn apply_move(&self, mv: SubtreeMove) -> Result<SubcategoryNode> {
        let node_id = mv.node_id;
        self.repo.apply_subtree_move(&mv).await?;
        metrics::record_cascade_size(mv.levels.len());

        info!(
            id = node_id,
            new_parent_id = ?mv.new_parent_id,
            category_id = mv.category_id,
            cascaded = mv.levels.len(),
            "子树迁移完成"
        );
        self.navigator.get_node(node_id).await
    }

    async fn delete_image_best_effort(&self, id: i64, reference: &str) {
        if let Err(e) = self.images.delete_image(reference).await {
            warn!(id, image = reference, error = %e, "旧图片删除失败，已忽略");
        }
    }
}

/// 将更新输入合并为稀疏补丁
///
/// 次要语言原先沿用主语言时，主语言改名后继续沿用。
fn build_patch(current: &SubcategoryNode, input: UpdateSubcategory) -> Result<SubcategoryPatch> {
    let name_en = match input.name_en {
        Some(en) if en.trim().is_empty() => {
            return Err(HierarchyError::Validation("name cannot be blank".into()));
        }
        other => trimmed(other),
    };
    let name_ar = trimmed(input.name_ar);

    let name = if name_en.is_some() || name_ar.is_some() {
        let en = name_en.unwrap_or_else(|| current.name.en.clone());
        let ar = name_ar.or_else(|| {
            (current.name.ar != current.name.en).then(|| current.name.ar.clone())
        });
        Some(LocalizedText::new(en, ar)).filter(|n| *n != current.name)
    } else {
        None
    };

    let description = if input.clear_description {
        current.description.as_ref().map(|_| None)
    } else {
        let en = trimmed(input.description_en);
        let ar = trimmed(input.description_ar);
        if en.is_none() && ar.is_none() {
            None
        } else {
            let base = current.description.as_ref();
            let ar = ar.or_else(|| {
                base.filter(|d| d.ar != d.en).map(|d| d.ar.clone())
            });
            let en = en.or_else(|| base.map(|d| d.en.clone()));
            Some(LocalizedText::from_columns(en, ar)).filter(|d| *d != current.description)
        }
    };

    let image = if input.remove_image {
        current.image.as_ref().map(|_| None)
    } else {
        trimmed(input.image)
            .filter(|new| current.image.as_deref() != Some(new.as_str()))
            .map(Some)
    };

    Ok(SubcategoryPatch {
        name,
        description,
        display_order: input.display_order.filter(|o| *o != current.display_order),
        is_active: input.is_active.filter(|v| *v != current.is_active),
        is_featured: input.is_featured.filter(|v| *v != current.is_featured),
        image,
    })
}

fn observe<T>(operation: &str, start: Instant, result: &Result<T>) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => e.error_code(),
    };
    metrics::record_subcategory_mutation(operation, status, start.elapsed().as_secs_f64());
}
