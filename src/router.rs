//! Server router definition.
//!
//! The following routes are supported:
//!
//! - GET: `/api/v1/health`
//! - POST: `/api/v1/kakao`

use crate::kakao::{api::KakaoClient, router::kakao_router, session::Session};
use axum::{http::StatusCode, routing::get, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

/// A newtype wrapper around the bearer token callers of the relay must
/// present.
#[derive(Clone)]
pub struct RelayToken(pub String);

/// Dependencies shared by routes across requests.
#[derive(Clone)]
pub struct Deps {
    pub kakao_client: Arc<KakaoClient>,
    /// The one logged-in session. Locking it serialises sends, as concurrent
    /// flows on a session would race on its cookies and CSRF token.
    pub session: Arc<Mutex<Session>>,
    pub relay_token: RelayToken,
}

/// Instantiate a new router with tracing.
pub fn new(deps: Deps) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
        .on_response(trace::DefaultOnResponse::new().level(Level::INFO));

    let v1 = Router::new()
        .nest("/kakao", kakao_router(&deps.relay_token))
        .layer(trace_layer)
        // Exclude the health check route from tracing.
        .route("/health", get(|| async { StatusCode::OK }));

    let api = Router::new().nest("/v1", v1);

    Router::new().nest("/api", api).with_state(deps)
}

#[cfg(test)]
mod tests_general {
    use super::*;
    use crate::kakao::config::{ApiKey, KakaoConfig};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn router() -> Router {
        super::new(Deps {
            kakao_client: Arc::new(KakaoClient::new(
                "any".to_owned(),
                KakaoConfig::new(ApiKey("any".to_owned())),
            )),
            session: Arc::new(Mutex::new(Session::default())),
            relay_token: RelayToken("any".to_owned()),
        })
    }

    #[tokio::test]
    async fn test_not_found() {
        let req = Request::builder()
            .uri("/bad/route")
            .body(Body::empty())
            .unwrap();

        let res = router().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();

        let res = router().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
    }
}
