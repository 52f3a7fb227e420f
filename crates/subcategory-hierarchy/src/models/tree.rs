//! 树遍历结果结构

use serde::{Deserialize, Serialize};

use super::locale::LocalizedText;
use super::subcategory::SubcategoryNode;

/// 带相对深度的后代节点（直接子节点深度为 1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescendantNode {
    pub node: SubcategoryNode,
    pub depth: i32,
}

/// 嵌套树节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub node: SubcategoryNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(node: SubcategoryNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// 以该节点为根的子树节点总数（含自身）
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbKind {
    Category,
    Subcategory,
}

/// 面包屑元素，分类本身位于 level 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub kind: BreadcrumbKind,
    pub id: i64,
    pub name: LocalizedText,
    pub level: i32,
}

impl Breadcrumb {
    pub fn category(category: &CategorySummary) -> Self {
        Self {
            kind: BreadcrumbKind::Category,
            id: category.id,
            name: category.name.clone(),
            level: 0,
        }
    }

    pub fn subcategory(node: &SubcategoryNode) -> Self {
        Self {
            kind: BreadcrumbKind::Subcategory,
            id: node.id,
            name: node.name.clone(),
            level: node.level,
        }
    }
}

/// 顶级分类摘要（由分类查询方提供）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: LocalizedText,
}
