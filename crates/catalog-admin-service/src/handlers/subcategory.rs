//! 子分类管理 API 处理器
//!
//! 节点的增删改查、层级调整、树查询与商品关联。

use axum::{Json, extract::State};
use subcategory_hierarchy::presentation::{
    self, BreadcrumbView, DescendantView, SubcategoryView,
};
use subcategory_hierarchy::{Locale, SubcategoryNode};
use tracing::info;

use crate::{
    dto::{
        ApiResponse, CreateSubcategoryRequest, LocaleQuery, MoveCategoryRequest, PageResponse,
        PaginationParams, ProductCountDto, ProductCountQuery, ReleaseProductsDto,
        ReorderRequest, ReparentRequest, SubcategoryDetailDto, SubcategoryQueryFilter,
        UpdateStatusRequest, UpdateSubcategoryRequest,
    },
    error::{AdminError, Result},
    extract::{ActorId, ApiPath, ApiQuery, ValidatedJson},
    state::AppState,
};

type ViewResponse = Json<ApiResponse<SubcategoryView>>;

fn view(node: &SubcategoryNode, locale: Locale) -> Result<SubcategoryView> {
    presentation::to_view(Some(node), locale)
        .ok_or_else(|| AdminError::Internal(format!("子分类 {} 映射失败", node.id)))
}

/// 分页查询子分类
///
/// GET /api/admin/subcategories
pub async fn list_subcategories(
    State(state): State<AppState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<SubcategoryQueryFilter>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<PageResponse<SubcategoryView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    let (nodes, total) = state
        .navigator()
        .search(&filter.into(), pagination.limit(), pagination.offset())
        .await?;

    let items = presentation::nodes_to_views(&nodes, locale);
    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page.max(1),
        pagination.limit(),
    ))))
}

/// 创建子分类
///
/// POST /api/admin/subcategories
pub async fn create_subcategory(
    State(state): State<AppState>,
    actor: ActorId,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
    ValidatedJson(req): ValidatedJson<CreateSubcategoryRequest>,
) -> Result<ViewResponse> {
    let locale = locale.resolve(state.default_locale)?;
    let node = state.mutator().create_node(req.into(), actor.0).await?;

    info!(subcategory_id = node.id, category_id = node.category_id, "Subcategory created");
    Ok(Json(ApiResponse::success(view(&node, locale)?)))
}

/// 子分类详情（含面包屑）
///
/// GET /api/admin/subcategories/{id}
pub async fn get_subcategory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<SubcategoryDetailDto>>> {
    let locale = locale.resolve(state.default_locale)?;
    let node = state.navigator().get_node(id).await?;
    let chain = state.navigator().get_parent_chain(id).await?;

    Ok(Json(ApiResponse::success(SubcategoryDetailDto {
        subcategory: view(&node, locale)?,
        breadcrumbs: presentation::breadcrumbs_to_views(&chain, locale),
    })))
}

/// 更新子分类字段
///
/// PUT /api/admin/subcategories/{id}
pub async fn update_subcategory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    actor: ActorId,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
    ValidatedJson(req): ValidatedJson<UpdateSubcategoryRequest>,
) -> Result<ViewResponse> {
    let locale = locale.resolve(state.default_locale)?;
    let node = state.mutator().update_fields(id, req.into(), actor.0).await?;

    info!(subcategory_id = id, "Subcategory updated");
    Ok(Json(ApiResponse::success(view(&node, locale)?)))
}

/// 删除子分类
///
/// DELETE /api/admin/subcategories/{id}
///
/// 存在子节点或关联商品时拒绝删除。
pub async fn delete_subcategory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    actor: ActorId,
) -> Result<Json<ApiResponse<()>>> {
    state.mutator().delete(id, actor.0).await?;

    info!(subcategory_id = id, "Subcategory deleted");
    Ok(Json(ApiResponse::success_empty()))
}

/// 改挂父节点
///
/// PATCH /api/admin/subcategories/{id}/parent
pub async fn reparent_subcategory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    actor: ActorId,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
    ValidatedJson(req): ValidatedJson<ReparentRequest>,
) -> Result<ViewResponse> {
    let locale = locale.resolve(state.default_locale)?;
    let node = state.mutator().reparent(id, req.parent_id, actor.0).await?;
    Ok(Json(ApiResponse::success(view(&node, locale)?)))
}

/// 迁移到其他顶级分类
///
/// PATCH /api/admin/subcategories/{id}/category
pub async fn move_subcategory_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    actor: ActorId,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
    ValidatedJson(req): ValidatedJson<MoveCategoryRequest>,
) -> Result<ViewResponse> {
    let locale = locale.resolve(state.default_locale)?;
    let node = state
        .mutator()
        .move_to_category(id, req.category_id, actor.0)
        .await?;
    Ok(Json(ApiResponse::success(view(&node, locale)?)))
}

/// 切换启用/推荐状态
///
/// PATCH /api/admin/subcategories/{id}/status
pub async fn update_subcategory_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    actor: ActorId,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> Result<ViewResponse> {
    let locale = locale.resolve(state.default_locale)?;
    let node = state
        .mutator()
        .set_status(id, req.is_active, req.is_featured, actor.0)
        .await?;
    Ok(Json(ApiResponse::success(view(&node, locale)?)))
}

/// 批量调整同级排序
///
/// PUT /api/admin/subcategories/reorder
pub async fn reorder_subcategories(
    State(state): State<AppState>,
    actor: ActorId,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<SubcategoryView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    let nodes = state.mutator().reorder(req.into_pairs(), actor.0).await?;
    Ok(Json(ApiResponse::success(presentation::nodes_to_views(
        &nodes, locale,
    ))))
}

/// 直接子节点
///
/// GET /api/admin/subcategories/{id}/children
pub async fn list_children(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<Vec<SubcategoryView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    state.navigator().get_node(id).await?;
    let children = state.navigator().get_children(id).await?;
    Ok(Json(ApiResponse::success(presentation::nodes_to_views(
        &children, locale,
    ))))
}

/// 全部后代（带相对深度）
///
/// GET /api/admin/subcategories/{id}/descendants
pub async fn list_descendants(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<Vec<DescendantView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    let descendants = state.navigator().get_descendants(id).await?;
    Ok(Json(ApiResponse::success(presentation::descendants_to_views(
        &descendants,
        locale,
    ))))
}

/// 面包屑
///
/// GET /api/admin/subcategories/{id}/breadcrumbs
pub async fn get_breadcrumbs(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(locale): ApiQuery<LocaleQuery>,
) -> Result<Json<ApiResponse<Vec<BreadcrumbView>>>> {
    let locale = locale.resolve(state.default_locale)?;
    let chain = state.navigator().get_parent_chain(id).await?;
    Ok(Json(ApiResponse::success(presentation::breadcrumbs_to_views(
        &chain, locale,
    ))))
}

/// 商品计数
///
/// GET /api/admin/subcategories/{id}/product-count
pub async fn get_product_count(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ProductCountQuery>,
) -> Result<Json<ApiResponse<ProductCountDto>>> {
    let product_count = if query.include_descendants {
        state
            .products()
            .get_product_count_including_descendants(id)
            .await?
    } else {
        state.navigator().get_node(id).await?;
        state.products().get_product_count(id).await?
    };

    Ok(Json(ApiResponse::success(ProductCountDto {
        subcategory_id: id,
        product_count,
        include_descendants: query.include_descendants,
    })))
}

/// 解除商品与该节点的关联
///
/// POST /api/admin/subcategories/{id}/products/release
pub async fn release_products(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    actor: ActorId,
) -> Result<Json<ApiResponse<ReleaseProductsDto>>> {
    state.navigator().get_node(id).await?;
    let released = state.products().reassign_products_to_null(id, actor.0).await?;

    Ok(Json(ApiResponse::success(ReleaseProductsDto {
        subcategory_id: id,
        released,
    })))
}
