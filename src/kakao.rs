//! Share rich link messages into KakaoTalk chat rooms.
//!
//! Kakao has no public API for sending messages as a user. Its sharer, the
//! web widget behind "share to KakaoTalk" buttons, does however let a
//! logged-in user send a link to any of their chats, and we drive it the way
//! a browser would.
//!
//! See [link] for the sequence of calls involved.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod link;
pub mod room;
pub mod router;
pub mod scrape;
pub mod session;
