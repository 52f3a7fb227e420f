//! 展示映射
//!
//! 节点 + 语言 -> 扁平的 API 结构，名称/描述按语言解析并回落到主语言。
//! 纯函数，无 I/O。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    Breadcrumb, BreadcrumbKind, DescendantNode, Locale, SubcategoryNode, TreeNode,
};

/// 子分类展示结构
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryView {
    pub id: i64,
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub level: i32,
    /// 当前语言下的名称
    pub name: String,
    pub description: Option<String>,
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 仅在映射嵌套树时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SubcategoryView>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescendantView {
    #[serde(flatten)]
    pub node: SubcategoryView,
    pub depth: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbView {
    pub kind: BreadcrumbKind,
    pub id: i64,
    pub name: String,
    pub level: i32,
}

pub fn to_view(node: Option<&SubcategoryNode>, locale: Locale) -> Option<SubcategoryView> {
    node.map(|n| flat_view(n, locale))
}

fn flat_view(node: &SubcategoryNode, locale: Locale) -> SubcategoryView {
    let description = node.description.as_ref();
    SubcategoryView {
        id: node.id,
        category_id: node.category_id,
        parent_id: node.parent_id,
        level: node.level,
        name: resolve(node.name.get(locale), &node.name.en),
        description: description.map(|d| resolve(d.get(locale), &d.en)),
        name_en: node.name.en.clone(),
        name_ar: node.name.ar.clone(),
        description_en: description.map(|d| d.en.clone()),
        description_ar: description.map(|d| d.ar.clone()),
        display_order: node.display_order,
        is_active: node.is_active,
        is_featured: node.is_featured,
        image: node.image.clone(),
        created_at: node.created_at,
        updated_at: node.updated_at,
        children: None,
    }
}

fn resolve(localized: &str, primary: &str) -> String {
    if localized.trim().is_empty() {
        primary.to_string()
    } else {
        localized.to_string()
    }
}

pub fn nodes_to_views(nodes: &[SubcategoryNode], locale: Locale) -> Vec<SubcategoryView> {
    nodes.iter().map(|n| flat_view(n, locale)).collect()
}

/// 嵌套树映射，每一层都带 `children`（叶子为空数组）
pub fn tree_to_views(tree: &[TreeNode], locale: Locale) -> Vec<SubcategoryView> {
    tree.iter()
        .map(|t| SubcategoryView {
            children: Some(tree_to_views(&t.children, locale)),
            ..flat_view(&t.node, locale)
        })
        .collect()
}

pub fn descendants_to_views(descendants: &[DescendantNode], locale: Locale) -> Vec<DescendantView> {
    descendants
        .iter()
        .map(|d| DescendantView {
            node: flat_view(&d.node, locale),
            depth: d.depth,
        })
        .collect()
}

pub fn breadcrumbs_to_views(chain: &[Breadcrumb], locale: Locale) -> Vec<BreadcrumbView> {
    chain
        .iter()
        .map(|c| BreadcrumbView {
            kind: c.kind,
            id: c.id,
            name: resolve(c.name.get(locale), &c.name.en),
            level: c.level,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalizedText;

    fn node(id: i64) -> SubcategoryNode {
        let now = Utc::now();
        SubcategoryNode {
            id,
            category_id: 1,
            parent_id: None,
            level: 1,
            name: LocalizedText::new("Phones", Some("هواتف".to_string())),
            description: Some(LocalizedText::new("All phones", None)),
            display_order: 2,
            is_active: true,
            is_featured: true,
            image: Some("sub/1.png".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_none_maps_to_none() {
        assert_eq!(to_view(None, Locale::En), None);
    }

    #[test]
    fn test_locale_resolution_with_fallback() {
        let n = node(1);
        let ar = to_view(Some(&n), Locale::Ar).unwrap();
        assert_eq!(ar.name, "هواتف");
        assert_eq!(ar.description.as_deref(), Some("All phones"));
        assert_eq!(ar.name_en, "Phones");
        assert!(ar.children.is_none());

        let mut blank = node(2);
        blank.name.ar = String::new();
        assert_eq!(to_view(Some(&blank), Locale::Ar).unwrap().name, "Phones");
    }

    #[test]
    fn test_serialized_shape() {
        let view = to_view(Some(&node(1)), Locale::En).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["categoryId"], 1);
        assert_eq!(json["displayOrder"], 2);
        assert_eq!(json["isFeatured"], true);
        assert!(json.get("children").is_none());
    }

    #[test]
    fn test_tree_views_nest_children() {
        let mut child = node(2);
        child.parent_id = Some(1);
        child.level = 2;
        let tree = vec![TreeNode {
            node: node(1),
            children: vec![TreeNode::leaf(child)],
        }];

        let views = tree_to_views(&tree, Locale::En);
        let children = views[0].children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, 2);
        assert_eq!(children[0].children.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_descendant_view_flattens() {
        let d = DescendantNode {
            node: node(3),
            depth: 2,
        };
        let json = serde_json::to_value(descendants_to_views(&[d], Locale::En)).unwrap();
        assert_eq!(json[0]["id"], 3);
        assert_eq!(json[0]["depth"], 2);
    }

    #[test]
    fn test_breadcrumb_views() {
        let chain = vec![
            Breadcrumb {
                kind: BreadcrumbKind::Category,
                id: 1,
                name: LocalizedText::new("Catalog", Some("الكتالوج".to_string())),
                level: 0,
            },
            Breadcrumb::subcategory(&node(5)),
        ];
        let views = breadcrumbs_to_views(&chain, Locale::Ar);
        assert_eq!(views[0].name, "الكتالوج");
        assert_eq!(views[0].level, 0);
        assert_eq!(views[1].name, "هواتف");
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["kind"], "category");
    }
}
