//! HTTP route table.
//!
//! Everything under `/api/v1` requires a bearer token; `/health` is public.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{handlers, middleware, state::AppState};

/// Room for multipart framing around the largest accepted document.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_document_bytes + MULTIPART_OVERHEAD_BYTES;

    // Static segments (`export`, `draft`, `bulk-*`) win over `{id}` in axum's matcher.
    let authenticated_routes = Router::new()
        // Merchant workflow
        .route("/api/v1/merchants", get(handlers::merchants::list_merchants))
        .route(
            "/api/v1/merchants/export",
            get(handlers::merchants::export_merchants),
        )
        .route(
            "/api/v1/merchants/draft",
            post(handlers::merchants::create_draft),
        )
        .route(
            "/api/v1/merchants/bulk-approve",
            put(handlers::merchants::bulk_approve),
        )
        .route(
            "/api/v1/merchants/bulk-reject",
            put(handlers::merchants::bulk_reject),
        )
        .route(
            "/api/v1/merchants/{id}",
            get(handlers::merchants::get_merchant),
        )
        .route(
            "/api/v1/merchants/{id}/draft",
            put(handlers::merchants::update_draft),
        )
        .route(
            "/api/v1/merchants/{id}/ready-to-review",
            put(handlers::merchants::ready_to_review),
        )
        .route(
            "/api/v1/merchants/{id}/registration-status",
            put(handlers::merchants::update_registration_status),
        )
        .route(
            "/api/v1/merchants/{id}/alias-generation",
            put(handlers::merchants::retry_alias_generation),
        )
        // Merchant profile
        .route(
            "/api/v1/merchants/{id}/locations",
            post(handlers::profile::create_location),
        )
        .route(
            "/api/v1/merchants/{id}/locations/{location_id}",
            put(handlers::profile::update_location),
        )
        .route(
            "/api/v1/merchants/{id}/contact-persons",
            post(handlers::profile::create_contact_person),
        )
        .route(
            "/api/v1/merchants/{id}/contact-persons/{contact_person_id}",
            put(handlers::profile::update_contact_person),
        )
        .route(
            "/api/v1/merchants/{id}/business-owners",
            post(handlers::profile::create_business_owner),
        )
        .route(
            "/api/v1/merchants/{id}/business-owners/{owner_id}",
            put(handlers::profile::update_business_owner),
        )
        .route(
            "/api/v1/merchants/{id}/checkout-counters",
            get(handlers::profile::list_checkout_counters),
        )
        .route(
            "/api/v1/merchants/{id}/checkout-counters/{counter_id}",
            put(handlers::profile::update_checkout_counter),
        )
        .route(
            "/api/v1/merchants/{id}/license-document",
            post(handlers::documents::upload_license_document)
                .get(handlers::documents::download_license_document),
        )
        // Directory
        .route(
            "/api/v1/dfsps",
            get(handlers::dfsps::list_dfsps).post(handlers::dfsps::create_dfsp),
        )
        .route("/api/v1/users/me", get(handlers::users::current_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// Router over a pool that never connects; only paths that answer
    /// before touching the database can be exercised.
    fn test_router() -> Router {
        let config = Config::from_vars(vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/merchants_test".to_string(),
        )])
        .expect("config loads");
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        build_router(AppState::new(pool, config))
    }

    async fn send(router: Router, request: Request<Body>) -> StatusCode {
        router.oneshot(request).await.expect("response").status()
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let request = Request::builder()
            .uri("/api/v1/merchants")
            .body(Body::empty())
            .unwrap();

        assert_eq!(send(test_router(), request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let request = Request::builder()
            .method("PUT")
            .uri("/api/v1/merchants/bulk-approve")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"ids":[]}"#))
            .unwrap();

        assert_eq!(send(test_router(), request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/api/v1/terminals")
            .body(Body::empty())
            .unwrap();

        assert_eq!(send(test_router(), request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected_before_auth() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/v1/dfsps")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            send(test_router(), request).await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
