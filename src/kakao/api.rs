//! Request helpers for the Kakao sharer, the web widget behind "share to
//! KakaoTalk" buttons.

use super::{config::KakaoConfig, session::Session};
use reqwest::header::{COOKIE, REFERER};

/// The base URL of the Kakao sharer.
pub const SHARER_BASE: &str = "https://sharer.kakao.com";

pub const PICKER_PATH: &str = "/talk/friends/picker/link";
pub const CHATS_PATH: &str = "/api/talk/chats";
pub const SEND_PATH: &str = "/api/talk/message/link";

/// A reusable client that holds a connection pool internally, as per
/// [reqwest::Client], along with the pipeline-level configuration.
///
/// The client holds no session state of its own, so one client can serve any
/// number of [Session]s.
pub struct KakaoClient {
    client: reqwest::Client,
    base: String,
    pub config: KakaoConfig,
}

impl KakaoClient {
    pub fn new(base: String, config: KakaoConfig) -> Self {
        KakaoClient {
            client: reqwest::Client::new(),
            base,
            config,
        }
    }

    /// The picker page, which every later call names as its `Referer`.
    pub fn picker_url(&self) -> String {
        self.base.to_owned() + PICKER_PATH
    }

    /// Create a GET request to a sharer endpoint, carrying the session's
    /// cookies and the configured deadline.
    pub fn get(&self, path: &str, session: &Session) -> reqwest::RequestBuilder {
        self.with_session(self.client.get(self.base.to_owned() + path), session)
    }

    /// Create a POST request to a sharer endpoint, carrying the session's
    /// cookies and the configured deadline.
    pub fn post(&self, path: &str, session: &Session) -> reqwest::RequestBuilder {
        self.with_session(self.client.post(self.base.to_owned() + path), session)
    }

    fn with_session(
        &self,
        req: reqwest::RequestBuilder,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        let req = req.timeout(self.config.timeout);

        match session.cookie_header() {
            Some(cookies) => req.header(COOKIE, cookies),
            None => req,
        }
    }

    /// The headers shared by the room directory and send calls, which the
    /// sharer's own scripts make from within the picker page.
    pub fn with_picker_headers(
        &self,
        req: reqwest::RequestBuilder,
        csrf: &str,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        req.header(REFERER, self.picker_url())
            .header("Csrf-Token", csrf)
            .header("App-Key", api_key)
    }
}
