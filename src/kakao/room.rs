//! List the account's chat rooms and pick one out by title.

use super::{
    api::*,
    config::ApiKey,
    error::{KakaoError, NetworkFailure, Step},
    session::Session,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use std::fmt;
use tracing::debug;

/// Room titles as are visible in KakaoTalk. Titles aren't unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTitle(pub String);

/// Format without the surrounding newtype wrapper.
impl fmt::Display for RoomTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: String,
    pub title: RoomTitle,
    pub member_count: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(rename = "profileImageURLs", default)]
    pub profile_image_urls: Vec<String>,
}

/// The response of the room directory endpoint.
///
/// ```json
/// {
///     "securityKey": "...",
///     "chats": [{
///         "id": "18273645",
///         "title": "Friends",
///         "memberCount": 3,
///         "profileImageURLs": []
///     }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDirectory {
    /// Binds a send to this particular listing.
    pub security_key: String,
    pub chats: Vec<ChatRoom>,
}

impl KakaoClient {
    /// Fetch the account's chat rooms. Must follow a picker call, as the
    /// endpoint expects that call's CSRF token.
    pub async fn fetch_rooms(
        &self,
        session: &mut Session,
        api_key: &ApiKey,
    ) -> Result<RoomDirectory, KakaoError> {
        let csrf = session.csrf_token().ok_or(KakaoError::PickerRequired)?;

        let res = self
            .with_picker_headers(self.get(CHATS_PATH, session), &csrf.0, &api_key.0)
            .send()
            .await
            .map_err(|e| KakaoError::network(Step::Rooms, e))?;

        if !res.status().is_success() {
            return Err(KakaoError::Network(
                Step::Rooms,
                NetworkFailure::Status(res.status()),
            ));
        }

        session.merge_response_cookies(res.headers());

        let body = res
            .text()
            .await
            .map_err(|e| KakaoError::network(Step::Rooms, e))?;

        let directory: RoomDirectory =
            serde_json::from_str(&body).map_err(|e| KakaoError::Protocol(Step::Rooms, e))?;

        debug!(rooms = directory.chats.len(), "Fetched room directory");

        Ok(directory)
    }
}

/// Find the first room with exactly the given title, in the order the
/// directory lists them.
///
/// A first match with no members or no id can't be sent to, and is reported
/// the same as no match at all.
pub fn resolve_room<'a>(
    title: &RoomTitle,
    directory: &'a RoomDirectory,
) -> Result<&'a ChatRoom, KakaoError> {
    directory
        .chats
        .iter()
        .find(|c| &c.title == title)
        .filter(|c| c.member_count > 0 && !c.id.is_empty())
        .ok_or_else(|| KakaoError::RoomNotFound(title.clone()))
}
