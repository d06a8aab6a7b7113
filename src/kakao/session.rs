//! The cookies and CSRF token accumulated over a logged-in session.
//!
//! A [Session] is owned by whoever drives the pipeline and is passed into
//! each call as `&mut Session`. Two flows sharing a session would race on the
//! picker's cookie and token updates, so concurrent use must be serialised by
//! the caller, for example behind a mutex.

use cookie::Cookie;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// The anti-forgery token scraped from the picker page, echoed back in the
/// `Csrf-Token` header of later calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CsrfToken(pub String);

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    cookies: Vec<Cookie<'static>>,
    csrf_token: Option<CsrfToken>,
}

impl Session {
    /// Start a session from the cookies a login produced.
    pub fn new(cookies: Vec<Cookie<'static>>) -> Self {
        let mut session = Session::default();
        session.merge(cookies);
        session
    }

    /// Merge cookies into the session. A cookie replaces any existing cookie
    /// of the same name; everything else is kept, as servers only send the
    /// cookies that changed.
    pub fn merge<I>(&mut self, cookies: I)
    where
        I: IntoIterator<Item = Cookie<'static>>,
    {
        for c in cookies {
            match self.cookies.iter_mut().find(|x| x.name() == c.name()) {
                Some(existing) => *existing = c,
                None => self.cookies.push(c),
            }
        }
    }

    /// Merge every `Set-Cookie` header of a response.
    pub fn merge_response_cookies(&mut self, headers: &HeaderMap) {
        let cookies: Vec<Cookie<'static>> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| match v.to_str().map(|s| Cookie::parse(s.to_owned())) {
                Ok(Ok(c)) => Some(c),
                _ => {
                    warn!("Skipping unparsable Set-Cookie header");
                    None
                }
            })
            .collect();

        if !cookies.is_empty() {
            debug!(count = cookies.len(), "Merging response cookies");
        }

        self.merge(cookies);
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// The value of a `Cookie` request header carrying every session cookie,
    /// or `None` for an empty session.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect();

        Some(pairs.join("; "))
    }

    pub fn set_csrf_token(&mut self, token: CsrfToken) {
        self.csrf_token = Some(token);
    }

    pub fn csrf_token(&self) -> Option<&CsrfToken> {
        self.csrf_token.as_ref()
    }
}
