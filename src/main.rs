//! The messenger of the gods, carrying links into KakaoTalk chat rooms.
//!
//! Iris is a small HTTP relay: POST it a link message naming a chat room, and
//! it shares the link into that room as the configured Kakao account. The
//! only platform currently supported is [KakaoTalk][kakao].

use dotenvy::dotenv;
use kakao::{
    api::{KakaoClient, SHARER_BASE},
    auth::{Credentials, PresetCookies},
    config::{required, ConfigError, KakaoConfig},
    session::Session,
};
use router::{Deps, RelayToken};
use std::{env, net::SocketAddr, process, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};
use tracing::{error, info, warn};

mod kakao;
mod router;

/// Application entrypoint. Initialises tracing, checks for environment
/// variables, logs in, binds to 0.0.0.0, and starts the server.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let has_dotenv = dotenv().is_ok();
    if !has_dotenv {
        warn!("No .env found");
    }

    let deps = match deps().await {
        Ok(x) => x,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let port: u16 = match env::var("PORT").map(|x| x.parse()) {
        Ok(Ok(x)) => x,
        Ok(Err(_)) => {
            error!("Could not parse PORT to u16");
            process::exit(1);
        }
        Err(_) => 80,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(x) => x,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };

    server_(listener, deps).await;
}

/// Read configuration from the environment and log in to Kakao.
async fn deps() -> Result<Deps, String> {
    let show = |e: ConfigError| e.to_string();

    let config = KakaoConfig::from_env().map_err(show)?;
    let credentials = Credentials::from_env().map_err(show)?;
    let cookies = PresetCookies(required("KAKAO_COOKIES").map_err(show)?);
    let relay_token = RelayToken(required("IRIS_TOKEN").map_err(show)?);

    let session = Session::login(&cookies, &credentials)
        .await
        .map_err(|e| e.to_string())?;

    Ok(Deps {
        kakao_client: Arc::new(KakaoClient::new(SHARER_BASE.into(), config)),
        session: Arc::new(Mutex::new(session)),
        relay_token,
    })
}

/// Initialise a server without graceful shutdown.
async fn server_(listener: TcpListener, deps: Deps) {
    // Giving a receiver that will never resolve.
    server(listener, deps, oneshot::channel::<()>().1).await;
}

/// Initialise a server with graceful shutdown via `rx`.
async fn server(listener: TcpListener, deps: Deps, rx: oneshot::Receiver<()>) {
    match listener.local_addr() {
        Ok(addr) => info!("Listening on {}", addr),
        Err(e) => warn!("Listening on an unknown address: {}", e),
    }

    let res = axum::serve(listener, router::new(deps))
        .with_graceful_shutdown(async {
            rx.await.ok();
        })
        .await;

    if let Err(e) = res {
        error!("Server failed: {}", e);
    }
}
