//! Kakao subrouter definition.
//!
//! The following subroute is supported:
//!
//! - POST: `/`

use super::{
    config::Overrides,
    error::KakaoError,
    link::LinkPayload,
    room::RoomTitle,
};
use crate::router::{Deps, RelayToken};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use tower_http::validate_request::ValidateRequestHeaderLayer;
use tracing::error;

/// A link to share, and the room to share it into.
///
/// ```json
/// {
///     "room": "Friends",
///     "type": "custom",
///     "args": { "template_id": 1234 },
///     "api_key": "optional per-message app key",
///     "origin": "https://optional.example.com"
/// }
/// ```
#[derive(Deserialize)]
pub struct LinkMessage {
    pub room: RoomTitle,
    #[serde(flatten)]
    pub payload: LinkPayload,
    #[serde(flatten)]
    pub overrides: Overrides,
}

/// Instantiate a new Kakao subrouter.
pub fn kakao_router(token: &RelayToken) -> Router<Deps> {
    Router::new()
        .route("/", post(link_handler))
        .layer(ValidateRequestHeaderLayer::bearer(&token.0))
}

/// Handler for the POST subroute `/`.
///
/// A `Bearer` `Authorization` header matching `$IRIS_TOKEN` must be present.
///
/// Accepts a [LinkMessage] in `application/json` format. Sends share the one
/// logged-in session and so are made one at a time.
async fn link_handler(State(deps): State<Deps>, Json(m): Json<LinkMessage>) -> impl IntoResponse {
    let mut session = deps.session.lock().await;

    let res = deps
        .kakao_client
        .send_link(&mut session, &m.room, m.payload, &m.overrides)
        .await;

    match res {
        Ok(_) => (StatusCode::OK, String::new()),
        Err(e) => handle_kakao_err(&e),
    }
}

pub fn handle_kakao_err(e: &KakaoError) -> (StatusCode, String) {
    let code = match &e {
        KakaoError::Auth(_) => StatusCode::UNAUTHORIZED,
        KakaoError::Network(..) => StatusCode::BAD_GATEWAY,
        KakaoError::Extraction(_) => StatusCode::BAD_GATEWAY,
        KakaoError::Protocol(..) => StatusCode::BAD_GATEWAY,
        KakaoError::RoomNotFound(_) => StatusCode::BAD_REQUEST,
        KakaoError::PickerRequired => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let es = e.to_string();

    error!("{}", es);
    (code, es)
}
