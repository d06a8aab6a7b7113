//! Turning account credentials into a logged-in [Session].
//!
//! Kakao's web login is its own multi-step affair and lives outside this
//! crate. All the link pipeline needs from it is the resulting cookies, so it
//! is consumed through the [Login] trait.

use super::{
    config::{flag, required, ConfigError},
    error::KakaoError,
    session::Session,
};
use cookie::Cookie;
use std::future::Future;
use tracing::info;

pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Ask for a long-lived session, as the "stay signed in" checkbox does.
    pub keep_login: bool,
}

impl Credentials {
    /// Read `$KAKAO_EMAIL`, `$KAKAO_PASSWORD`, and `$KAKAO_KEEP_LOGIN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Credentials {
            email: required("KAKAO_EMAIL")?,
            password: required("KAKAO_PASSWORD")?,
            keep_login: flag("KAKAO_KEEP_LOGIN")?,
        })
    }
}

/// Anything that can log in to Kakao's web surface, yielding session cookies.
pub trait Login {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Vec<Cookie<'static>>, KakaoError>> + Send;
}

/// Cookies from a browser session that's already logged in, in `Cookie`
/// header format (`name=value; name2=value2`).
pub struct PresetCookies(pub String);

impl Login for PresetCookies {
    async fn login(&self, credentials: &Credentials) -> Result<Vec<Cookie<'static>>, KakaoError> {
        let cookies = Cookie::split_parse(self.0.to_owned())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| KakaoError::Auth(format!("Could not parse preset cookies: {}", e)))?;

        if cookies.is_empty() {
            return Err(KakaoError::Auth("No preset cookies".into()));
        }

        info!(
            email = %credentials.email,
            keep_login = credentials.keep_login,
            count = cookies.len(),
            "Using preset session cookies"
        );

        Ok(cookies)
    }
}

impl Session {
    /// Log in and start a session from the resulting cookies.
    pub async fn login<L: Login>(login: &L, credentials: &Credentials) -> Result<Self, KakaoError> {
        let cookies = login.login(credentials).await?;

        Ok(Session::new(cookies))
    }
}
