//! 探针处理器

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

pub const SERVICE_NAME: &str = "catalog-admin-service";

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查存储是否可用
///
/// 内存模式下没有外部依赖，始终就绪。
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (storage, ready) = match &state.database {
        Some(db) => match db.health_check().await {
            Ok(()) => ("ok", true),
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check failed");
                ("fail", false)
            }
        },
        None => ("memory", true),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if ready { "ok" } else { "degraded" },
            "service": SERVICE_NAME,
            "checks": { "storage": storage }
        })),
    )
}
