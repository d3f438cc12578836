//! Request extractors that reject with `AppError`.
//!
//! axum's own `Json`, `Query`, `Path` and `Multipart` reject with plain-text
//! bodies. These wrappers route the rejection through `AppError` so every
//! failure uses the `{"error": {"code", "message"}}` body.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `multipart/form-data` body.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Multipart::from_request(req, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::merchant::{MerchantDraftRequest, MerchantFilter};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::{get, post},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn router() -> Router {
        Router::new()
            .route(
                "/drafts",
                post(|AppJson(draft): AppJson<MerchantDraftRequest>| async move {
                    draft.dba_trading_name
                }),
            )
            .route(
                "/merchants",
                get(|AppQuery(filter): AppQuery<MerchantFilter>| async move {
                    format!("{:?}", filter.added_time)
                }),
            )
            .route(
                "/merchants/{id}",
                get(|AppPath(id): AppPath<Uuid>| async move { id.to_string() }),
            )
            .route(
                "/uploads",
                post(|AppMultipart(_): AppMultipart| async { "ok" }),
            )
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn error_code(body: &Value) -> &str {
        body["error"]["code"].as_str().expect("error envelope")
    }

    fn json_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/drafts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_enum_value_is_a_validation_failure() {
        let (status, body) = call(json_post(
            r#"{"dba_trading_name":"Corner Coffee","employees_num":"7","currency_code":"USD",
                "category_code":"5814","merchant_type":"Small Shop","license_number":"L-1"}"#,
        ))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "validation_failed");
        assert!(body["error"]["message"].as_str().unwrap().contains("employees_num"));
    }

    #[tokio::test]
    async fn malformed_json_is_an_invalid_request() {
        let (status, body) = call(json_post("{\"dba_trading_name\":")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "invalid_request");
    }

    #[tokio::test]
    async fn missing_content_type_is_an_invalid_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/drafts")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "invalid_request");
    }

    #[tokio::test]
    async fn unparsable_filter_is_a_validation_failure() {
        let request = Request::builder()
            .uri("/merchants?added_time=yesterday")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error_code(&body), "validation_failed");
    }

    #[tokio::test]
    async fn non_uuid_path_is_an_invalid_request() {
        let request = Request::builder()
            .uri("/merchants/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "invalid_request");
    }

    #[tokio::test]
    async fn non_multipart_upload_is_an_invalid_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/uploads")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "invalid_request");
    }

    #[tokio::test]
    async fn valid_path_passes_through() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .uri(format!("/merchants/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
