//! 子分类节点实体定义

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::locale::LocalizedText;

/// 子分类节点
///
/// 同一棵子树内所有节点共享根节点的 `category_id`；
/// `level` 对根节点为 1，其余为父节点 level + 1。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryNode {
    pub id: i64,
    /// 所属顶级分类 ID
    pub category_id: i64,
    /// 父级子分类 ID，为空表示分类下的根节点
    pub parent_id: Option<i64>,
    pub level: i32,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    /// 同级排序，数值越小越靠前
    pub display_order: i32,
    pub is_active: bool,
    pub is_featured: bool,
    /// 图片引用（由图片存储解释的不透明字符串）
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubcategoryNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// 同级排序：display_order，再按小写英文名，最后按 id
    ///
    /// 与 SQL 中的 `display_order, LOWER(name_en) COLLATE "C", id` 一致。
    pub fn sibling_cmp(&self, other: &Self) -> Ordering {
        self.display_order
            .cmp(&other.display_order)
            .then_with(|| {
                self.name
                    .en
                    .to_lowercase()
                    .cmp(&other.name.en.to_lowercase())
            })
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// 待持久化的新节点
///
/// 层级与分类由调用方（变更服务）计算好后写入，存储层不做任何校验。
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubcategory {
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub level: i32,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub display_order: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub image: Option<String>,
}

/// 稀疏更新
///
/// `None` 表示字段不变；对可空字段，`Some(None)` 表示清空。
/// 结构字段（parent_id / level / category_id）只能经由 [`SubtreeMove`] 修改。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubcategoryPatch {
    pub name: Option<LocalizedText>,
    pub description: Option<Option<LocalizedText>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub image: Option<Option<String>>,
}

impl SubcategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.display_order.is_none()
            && self.is_active.is_none()
            && self.is_featured.is_none()
            && self.image.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelAssignment {
    pub id: i64,
    pub level: i32,
}

/// 子树整体移动
///
/// `levels` 包含被移动节点本身及其全部后代的新绝对层级，
/// 整个子树统一写入 `category_id`，只有 `node_id` 的父节点被改写。
#[derive(Debug, Clone, PartialEq)]
pub struct SubtreeMove {
    pub node_id: i64,
    pub new_parent_id: Option<i64>,
    pub category_id: i64,
    pub levels: Vec<LevelAssignment>,
}

impl SubtreeMove {
    pub fn affected_ids(&self) -> Vec<i64> {
        self.levels.iter().map(|l| l.id).collect()
    }
}

/// 管理端分页列表的过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubcategoryFilter {
    pub category_id: Option<i64>,
    pub parent_id: Option<i64>,
    /// 只列出根节点（忽略 parent_id）
    pub roots_only: bool,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    /// 按任一语言名称模糊匹配
    pub keyword: Option<String>,
}

impl SubcategoryFilter {
    /// 内存实现与测试使用的匹配逻辑，与 SQL 条件保持一致
    pub fn matches(&self, node: &SubcategoryNode) -> bool {
        if self.category_id.is_some_and(|c| c != node.category_id) {
            return false;
        }
        if self.roots_only {
            if !node.is_root() {
                return false;
            }
        } else if let Some(parent) = self.parent_id {
            if node.parent_id != Some(parent) {
                return false;
            }
        }
        if self.is_active.is_some_and(|v| v != node.is_active) {
            return false;
        }
        if self.is_featured.is_some_and(|v| v != node.is_featured) {
            return false;
        }
        match self.keyword.as_deref().map(str::trim) {
            Some(kw) if !kw.is_empty() => {
                let kw = kw.to_lowercase();
                node.name.en.to_lowercase().contains(&kw)
                    || node.name.ar.to_lowercase().contains(&kw)
            }
            _ => true,
        }
    }
}
