//! 请求 DTO 定义
//!
//! 字段以 camelCase 为准，同时接受 snake_case 别名。

use serde::{Deserialize, Deserializer};
use subcategory_hierarchy::{
    CreateSubcategory, Locale, SubcategoryFilter, UpdateSubcategory,
};
use validator::Validate;

use crate::error::AdminError;

/// 创建子分类请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubcategoryRequest {
    #[serde(alias = "category_id")]
    pub category_id: i64,
    #[serde(alias = "parent_id")]
    pub parent_id: Option<i64>,
    #[serde(alias = "name_en", alias = "name")]
    #[validate(length(min = 1, max = 200, message = "名称长度必须在1-200个字符之间"))]
    pub name_en: String,
    #[serde(alias = "name_ar")]
    #[validate(length(max = 200, message = "名称长度不能超过200个字符"))]
    pub name_ar: Option<String>,
    #[serde(alias = "description_en", alias = "description")]
    #[validate(length(max = 2000, message = "描述不能超过2000个字符"))]
    pub description_en: Option<String>,
    #[serde(alias = "description_ar")]
    #[validate(length(max = 2000, message = "描述不能超过2000个字符"))]
    pub description_ar: Option<String>,
    #[serde(alias = "display_order")]
    pub display_order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "is_featured")]
    pub is_featured: Option<bool>,
    #[validate(length(max = 500, message = "图片引用不能超过500个字符"))]
    pub image: Option<String>,
}

impl From<CreateSubcategoryRequest> for CreateSubcategory {
    fn from(req: CreateSubcategoryRequest) -> Self {
        Self {
            category_id: req.category_id,
            parent_id: req.parent_id,
            name_en: req.name_en,
            name_ar: req.name_ar,
            description_en: req.description_en,
            description_ar: req.description_ar,
            display_order: req.display_order,
            is_active: req.is_active,
            is_featured: req.is_featured,
            image: req.image,
        }
    }
}

/// 更新子分类请求
///
/// 层级字段不在此处修改，见改挂父节点/迁移分类接口。
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubcategoryRequest {
    #[serde(alias = "name_en", alias = "name")]
    #[validate(length(min = 1, max = 200, message = "名称长度必须在1-200个字符之间"))]
    pub name_en: Option<String>,
    #[serde(alias = "name_ar")]
    #[validate(length(max = 200, message = "名称长度不能超过200个字符"))]
    pub name_ar: Option<String>,
    #[serde(alias = "description_en", alias = "description")]
    #[validate(length(max = 2000, message = "描述不能超过2000个字符"))]
    pub description_en: Option<String>,
    #[serde(alias = "description_ar")]
    #[validate(length(max = 2000, message = "描述不能超过2000个字符"))]
    pub description_ar: Option<String>,
    #[serde(default, alias = "clear_description")]
    pub clear_description: bool,
    #[serde(alias = "display_order")]
    pub display_order: Option<i32>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "is_featured")]
    pub is_featured: Option<bool>,
    #[validate(length(max = 500, message = "图片引用不能超过500个字符"))]
    pub image: Option<String>,
    #[serde(default, alias = "remove_image")]
    pub remove_image: bool,
}

impl From<UpdateSubcategoryRequest> for UpdateSubcategory {
    fn from(req: UpdateSubcategoryRequest) -> Self {
        Self {
            name_en: req.name_en,
            name_ar: req.name_ar,
            description_en: req.description_en,
            description_ar: req.description_ar,
            clear_description: req.clear_description,
            display_order: req.display_order,
            is_active: req.is_active,
            is_featured: req.is_featured,
            image: req.image,
            remove_image: req.remove_image,
        }
    }
}

/// 改挂父节点请求
///
/// `parentId` 必须出现，显式 `null` 表示提升为根节点。
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReparentRequest {
    #[serde(alias = "parent_id", deserialize_with = "required_nullable")]
    pub parent_id: Option<i64>,
}

/// 字段必须存在但允许为 null；带 deserialize_with 的 Option 字段缺失时报错
fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// 迁移分类请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MoveCategoryRequest {
    #[serde(alias = "category_id")]
    #[validate(range(min = 1, message = "分类ID必须为正数"))]
    pub category_id: i64,
}

/// 状态切换请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "is_featured")]
    pub is_featured: Option<bool>,
}

/// 同级排序请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[validate(length(min = 1, max = 500, message = "排序项数量必须在1-500之间"))]
    pub items: Vec<ReorderItem>,
}

#[derive(Debug, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    pub id: i64,
    #[serde(alias = "display_order")]
    pub display_order: i32,
}

impl ReorderRequest {
    pub fn into_pairs(self) -> Vec<(i64, i32)> {
        self.items
            .into_iter()
            .map(|item| (item.id, item.display_order))
            .collect()
    }
}

/// 分页参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size", alias = "page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 计算数据库查询的 offset
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// 获取限制条数（最大100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

/// 子分类列表过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryQueryFilter {
    #[serde(alias = "category_id")]
    pub category_id: Option<i64>,
    #[serde(alias = "parent_id")]
    pub parent_id: Option<i64>,
    #[serde(alias = "roots_only")]
    pub roots_only: Option<bool>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "is_featured")]
    pub is_featured: Option<bool>,
    pub keyword: Option<String>,
}

impl From<SubcategoryQueryFilter> for SubcategoryFilter {
    fn from(q: SubcategoryQueryFilter) -> Self {
        Self {
            category_id: q.category_id,
            parent_id: q.parent_id,
            roots_only: q.roots_only.unwrap_or(false),
            is_active: q.is_active,
            is_featured: q.is_featured,
            keyword: q.keyword,
        }
    }
}

/// 语言参数
#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

impl LocaleQuery {
    /// 未指定时使用默认语言，不支持的语言返回校验错误
    pub fn resolve(&self, default: Locale) -> Result<Locale, AdminError> {
        match self.locale.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map_err(AdminError::Validation),
        }
    }
}

/// 商品计数参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCountQuery {
    #[serde(default, alias = "include_descendants")]
    pub include_descendants: bool,
}
