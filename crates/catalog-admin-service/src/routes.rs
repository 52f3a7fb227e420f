//! 路由配置
//!
//! 定义所有 REST API 路由，并组装中间件得到完整应用。

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post, put},
};
use catalog_shared::observability::middleware as obs_middleware;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::handlers;
use crate::middleware::{audit_middleware, security_headers};
use crate::state::AppState;

/// 子分类路由
fn subcategory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/subcategories",
            get(handlers::subcategory::list_subcategories)
                .post(handlers::subcategory::create_subcategory),
        )
        .route(
            "/subcategories/reorder",
            put(handlers::subcategory::reorder_subcategories),
        )
        .route(
            "/subcategories/{id}",
            get(handlers::subcategory::get_subcategory)
                .put(handlers::subcategory::update_subcategory)
                .delete(handlers::subcategory::delete_subcategory),
        )
        .route(
            "/subcategories/{id}/parent",
            patch(handlers::subcategory::reparent_subcategory),
        )
        .route(
            "/subcategories/{id}/category",
            patch(handlers::subcategory::move_subcategory_category),
        )
        .route(
            "/subcategories/{id}/status",
            patch(handlers::subcategory::update_subcategory_status),
        )
        .route(
            "/subcategories/{id}/children",
            get(handlers::subcategory::list_children),
        )
        .route(
            "/subcategories/{id}/descendants",
            get(handlers::subcategory::list_descendants),
        )
        .route(
            "/subcategories/{id}/breadcrumbs",
            get(handlers::subcategory::get_breadcrumbs),
        )
        .route(
            "/subcategories/{id}/product-count",
            get(handlers::subcategory::get_product_count),
        )
        .route(
            "/subcategories/{id}/products/release",
            post(handlers::subcategory::release_products),
        )
}

/// 顶级分类下的子分类树路由
fn category_tree_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories/{id}/subcategories",
            get(handlers::category_tree::list_root_subcategories),
        )
        .route(
            "/categories/{id}/subcategories/tree",
            get(handlers::category_tree::get_subcategory_tree),
        )
}

/// 组合所有 API 路由（挂载于 /api/admin）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(subcategory_routes())
        .merge(category_tree_routes())
}

/// 跨域配置，`allowed_origins` 为逗号分隔的来源列表或 "*"
pub fn cors_layer(allowed_origins: &str, production: bool) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        if production {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 组装完整应用：API、探针与中间件
pub fn build_app(state: AppState, cors_origins: &str, production: bool) -> Router {
    Router::new()
        .nest("/api/admin", api_routes())
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(middleware::from_fn(audit_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(cors_origins, production))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
