pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::screenplay::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Screenplay API
        .route(
            "/api/v1/screenplay/export",
            post(handlers::handle_export).layer(upload_limit),
        )
        .route(
            "/api/v1/screenplay/classify",
            post(handlers::handle_classify),
        )
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::screenplay::{default_page_setup, ScreenplayFormatter};

    fn app_with(config: Config) -> Router {
        build_router(AppState::new(
            config,
            ScreenplayFormatter::new(default_page_setup()),
        ))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_service() {
        let response = app_with(Config::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "slugline-api");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let response = app_with(Config::default())
            .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_export_rejects_body_over_limit() {
        let config = Config {
            max_upload_bytes: 64,
            ..Config::default()
        };
        let body = format!(
            "--b\r\nContent-Disposition: form-data; name=\"script_text\"\r\n\r\n{}\r\n--b--\r\n",
            "A".repeat(512)
        );
        let request = Request::post("/api/v1/screenplay/export")
            .header("content-type", "multipart/form-data; boundary=b")
            .body(Body::from(body))
            .unwrap();

        let response = app_with(config).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
