//! 顶级分类下的子分类树 API 处理器

use axum::{Json, extract::State};
use subcategory_hierarchy::presentation::{self, SubcategoryView};
use tracing::debug;

use crate::{
    dto::{ApiResponse, LocaleQuery},
    error::Result,
    extract::{ApiPath, ApiQuery},
    state::AppState,
};

/// 分类下的根子分类
///
/// GET /api/admin/categories/{id}/subcategories
pub async fn list_root_subcategories(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<Vec<SubcategoryView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    state.navigator().get_category(category_id).await?;
    let roots = state.navigator().get_roots(category_id).await?;
    Ok(Json(ApiResponse::success(presentation::nodes_to_views(
        &roots, locale,
    ))))
}

/// 分类下的完整子分类树
///
/// GET /api/admin/categories/{id}/subcategories/tree
pub async fn get_subcategory_tree(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<Vec<SubcategoryView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    let category = state.navigator().get_category(category_id).await?;
    let tree = state.navigator().get_nested_tree(category_id).await?;

    debug!(category_id, category = %category.name.get(locale), roots = tree.len(), "Tree loaded");
    Ok(Json(ApiResponse::success(presentation::tree_to_views(
        &tree, locale,
    ))))
}
