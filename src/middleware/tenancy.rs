// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

use crate::common::error::ApiError;

// Header naming the tenant a request works on
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Tenant selected by the caller. Whether the caller may use it is
/// decided by the service, against the database.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

fn bad_header(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code: "invalid_tenant_header",
        error: message.to_string(),
        details: None,
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(TENANT_ID_HEADER)
            .ok_or_else(|| bad_header("The X-Tenant-ID header is required."))?;

        let value_str = value
            .to_str()
            .map_err(|_| bad_header("The X-Tenant-ID header contains invalid characters."))?;

        let tenant_id = Uuid::parse_str(value_str.trim())
            .map_err(|_| bad_header("The X-Tenant-ID header is not a valid UUID."))?;

        Ok(TenantContext(tenant_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<TenantContext, ApiError> {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(TENANT_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        TenantContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_a_uuid() {
        let id = Uuid::new_v4();
        let ctx = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(ctx.0, id);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_a_bad_request() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = extract(Some("not-a-uuid")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_tenant_header");
    }
}
