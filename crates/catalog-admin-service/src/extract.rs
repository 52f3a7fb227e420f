//! 自定义提取器

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AdminError;

/// 操作人 ID 所在的请求头
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// 当前操作人
///
/// 读取 `x-admin-id` 请求头；缺省为 None，非数字时拒绝请求。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActorId(pub Option<i64>);

impl ActorId {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AdminError> {
        let Some(raw) = headers.get(ADMIN_ID_HEADER) else {
            return Ok(Self(None));
        };
        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|id| Self(Some(id)))
            .ok_or_else(|| AdminError::Validation(format!("{ADMIN_ID_HEADER} must be an integer")))
    }
}

impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = AdminError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

/// 查询参数提取，解析失败时返回统一的 400 响应信封
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AdminError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// 路径参数提取，解析失败时返回统一的 400 响应信封
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AdminError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// 解析 JSON 请求体并执行 validator 校验
///
/// 解析失败与校验失败都以统一的 400 响应信封返回。
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AdminError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}
