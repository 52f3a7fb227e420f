//! 审计日志中间件
//!
//! 成功的写操作（POST/PUT/PATCH/DELETE）以结构化日志记录操作人、资源与动作。

use axum::{
    extract::Request,
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::extract::ADMIN_ID_HEADER;

pub async fn audit_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    if !is_write_method(&method) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let actor = actor_from_headers(request.headers());

    let response = next.run(request).await;

    // 失败的写操作没有产生变更，不记录
    if response.status().is_success() {
        let (target_type, target_id) = extract_target(&path);
        info!(
            target: "audit",
            actor_id = actor.as_deref().unwrap_or("anonymous"),
            action = action_for(&method, &path),
            target_type = target_type.as_deref().unwrap_or("-"),
            target_id = target_id.as_deref().unwrap_or("-"),
            path = %path,
            "Admin operation"
        );
    }

    response
}

fn is_write_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn actor_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ADMIN_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 动作名：子路由（parent/category/status/reorder/release）优先，否则按方法映射
fn action_for(method: &Method, path: &str) -> &'static str {
    let last = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default();
    match (method, last) {
        (_, "parent") => "reparent",
        (_, "category") => "move_category",
        (_, "status") => "set_status",
        (_, "reorder") => "reorder",
        (_, "release") => "release_products",
        (&Method::POST, _) => "create",
        (&Method::DELETE, _) => "delete",
        _ => "update",
    }
}

/// 如 /api/admin/subcategories/12/parent 解析为 ("subcategory", "12")
///
/// 仅当第二段为纯数字时认为是资源 ID。
fn extract_target(path: &str) -> (Option<String>, Option<String>) {
    let stripped = path.strip_prefix("/api/admin/").unwrap_or(path);
    let segments: Vec<&str> = stripped.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [module, id, ..] if id.chars().all(|c| c.is_ascii_digit()) => {
            let target_type = module
                .strip_suffix("ies")
                .map(|stem| format!("{stem}y"))
                .unwrap_or_else(|| module.to_string());
            (Some(target_type), Some(id.to_string()))
        }
        [module, ..] => (Some(module.to_string()), None),
        [] => (None, None),
    }
}
