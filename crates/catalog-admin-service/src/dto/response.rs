//! 响应 DTO 定义
//!
//! 所有 REST API 的响应体结构

use serde::Serialize;
use subcategory_hierarchy::presentation::{BreadcrumbView, SubcategoryView};

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    pub fn empty(page: i64, page_size: i64) -> Self {
        Self::new(Vec::new(), 0, page, page_size)
    }
}

/// API 统一响应
///
/// 成功与失败共用 `{success, code, message, data}` 信封，`data` 缺省为 null。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 成功响应（无数据）
    pub fn success_empty() -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }
}

/// 子分类详情：节点本身加面包屑
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryDetailDto {
    #[serde(flatten)]
    pub subcategory: SubcategoryView,
    pub breadcrumbs: Vec<BreadcrumbView>,
}

/// 商品计数
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCountDto {
    pub subcategory_id: i64,
    pub product_count: i64,
    pub include_descendants: bool,
}

/// 商品解绑结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseProductsDto {
    pub subcategory_id: i64,
    pub released: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_total_pages() {
        let page = PageResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);

        let page: PageResponse<i32> = PageResponse::empty(2, 20);
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 2);
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success_empty()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["code"], "SUCCESS");
        assert!(json["data"].is_null());

        let json = serde_json::to_value(ApiResponse::success(ProductCountDto {
            subcategory_id: 3,
            product_count: 7,
            include_descendants: true,
        }))
        .unwrap();
        assert_eq!(json["data"]["subcategoryId"], 3);
        assert_eq!(json["data"]["productCount"], 7);
        assert_eq!(json["data"]["includeDescendants"], true);
    }
}
