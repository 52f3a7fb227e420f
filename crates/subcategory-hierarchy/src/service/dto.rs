//! 变更服务输入
//!
//! 与 HTTP 层的请求结构解耦，字段均已是领域语义（多语言按列拆开）。

use crate::models::{LocalizedText, NewSubcategory};

/// 创建子分类
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateSubcategory {
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub image: Option<String>,
}

impl CreateSubcategory {
    pub fn new(category_id: i64, name_en: impl Into<String>) -> Self {
        Self {
            category_id,
            name_en: name_en.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub(crate) fn into_new(self, level: i32) -> NewSubcategory {
        NewSubcategory {
            category_id: self.category_id,
            parent_id: self.parent_id,
            level,
            name: LocalizedText::new(self.name_en.trim(), trimmed(self.name_ar)),
            description: LocalizedText::from_columns(
                trimmed(self.description_en),
                trimmed(self.description_ar),
            ),
            display_order: self.display_order.unwrap_or(0),
            is_active: self.is_active.unwrap_or(true),
            is_featured: self.is_featured.unwrap_or(false),
            image: trimmed(self.image),
        }
    }
}

/// 更新子分类的可变字段
///
/// `None` 表示不修改；`clear_description` / `remove_image` 显式清空对应字段，
/// 优先于同时给出的新值。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSubcategory {
    pub name_en: Option<String>,
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub clear_description: bool,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub image: Option<String>,
    pub remove_image: bool,
}

/// 空白字符串视为未提供
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
