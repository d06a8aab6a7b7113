//! Share a link payload into a chat room.
//!
//! The sharer offers no API for this, so we make the same three calls its web
//! widget makes, in order, each depending on what the last one produced:
//!
//! 1. POST the payload to the picker page. Kakao validates it and renders a
//!    page embedding a CSRF token and its validated copy of the payload.
//! 2. GET the room directory, using that CSRF token.
//! 3. POST the validated payload to a room from the directory, with the
//!    directory's security key.
//!
//! Tokens are issued per picker call, so every send repeats the whole
//! sequence. For the same reason nothing is retried: a failed send should be
//! retried as a fresh [KakaoClient::send_link].

use super::{
    api::*,
    config::{ApiKey, Overrides},
    error::{KakaoError, NetworkFailure, Step},
    room::{resolve_room, ChatRoom, RoomDirectory, RoomTitle},
    scrape::{extract, Picked, ValidatedLink},
    session::Session,
};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::{form_urlencoded, Url};

/// The key of the template version marker every payload must carry.
pub const VERSION_KEY: &str = "link_ver";
pub const DEFAULT_VERSION: &str = "4.0";
pub const DEFAULT_TYPE: &str = "custom";

/// Identifies us as Kakao's JavaScript SDK running in a desktop browser.
const KA_PREFIX: &str = "sdk/1.42.0 os/javascript lang/ko-KR device/Win32 origin/";

/// A link message as the caller describes it. `type` selects the validation
/// Kakao applies, for example `custom` for a template by id or `default` for
/// an inline template object, and `args` are that validation's parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "args", default)]
    pub fields: Map<String, Value>,
}

impl LinkPayload {
    /// Fill in the version marker and type if absent. Idempotent.
    pub fn normalize(&mut self) {
        if !self.fields.contains_key(VERSION_KEY) {
            self.fields
                .insert(VERSION_KEY.to_owned(), Value::from(DEFAULT_VERSION));
        }

        if self.kind.is_empty() {
            self.kind = DEFAULT_TYPE.to_owned();
        }
    }
}

/// The form the picker page expects.
#[derive(Serialize)]
struct PickerRequest<'a> {
    app_key: &'a str,
    validation_action: &'a str,
    /// The payload's fields, as a JSON string.
    validation_params: String,
    ka: String,
    /// Always empty, but the field must be present.
    lcba: &'a str,
}

/// The body of the send call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    validated_talk_link: &'a ValidatedLink,
    security_key: &'a str,
    receiver_type: &'static str,
    receiver_ids: [&'a str; 1],
    receiver_chat_room_member_count: [u32; 1],
}

/// Build the `ka` client descriptor for a given origin.
fn ka(origin: &Url) -> String {
    let serialized = origin.origin().ascii_serialization();
    let escaped: String = form_urlencoded::byte_serialize(serialized.as_bytes()).collect();

    KA_PREFIX.to_owned() + &escaped
}

impl KakaoClient {
    /// Send a link payload to the first usable room titled `room`.
    ///
    /// Fails fast: each step must succeed before the next is attempted, so
    /// for example no send is made if the room can't be resolved.
    pub async fn send_link(
        &self,
        session: &mut Session,
        room: &RoomTitle,
        mut payload: LinkPayload,
        overrides: &Overrides,
    ) -> Result<(), KakaoError> {
        payload.normalize();
        let (api_key, origin) = self.config.resolve(overrides);

        let link = self.pick(session, &payload, api_key, origin).await?;
        let directory = self.fetch_rooms(session, api_key).await?;
        let target = resolve_room(room, &directory)?;

        self.send(session, &link, &directory, target, api_key).await?;

        info!(room = %room, id = %target.id, kind = %payload.kind, "Sent link");

        Ok(())
    }

    /// Submit a payload for validation, storing the page's CSRF token in the
    /// session and returning the validated payload.
    async fn pick(
        &self,
        session: &mut Session,
        payload: &LinkPayload,
        api_key: &ApiKey,
        origin: &Url,
    ) -> Result<ValidatedLink, KakaoError> {
        let form = PickerRequest {
            app_key: &api_key.0,
            validation_action: &payload.kind,
            validation_params: Value::Object(payload.fields.clone()).to_string(),
            ka: ka(origin),
            lcba: "",
        };

        let res = self
            .post(PICKER_PATH, session)
            .form(&form)
            .send()
            .await
            .map_err(|e| KakaoError::network(Step::Picker, e))?;

        if !res.status().is_success() {
            return Err(KakaoError::Network(
                Step::Picker,
                NetworkFailure::Status(res.status()),
            ));
        }

        session.merge_response_cookies(res.headers());

        let body = res
            .text()
            .await
            .map_err(|e| KakaoError::network(Step::Picker, e))?;

        let Picked { csrf, link } = extract(&body)?;
        debug!("Scraped picker page");

        session.set_csrf_token(csrf);

        Ok(link)
    }

    /// Make the final send call. Whatever the response contains beyond its
    /// status is ignored.
    async fn send(
        &self,
        session: &mut Session,
        link: &ValidatedLink,
        directory: &RoomDirectory,
        target: &ChatRoom,
        api_key: &ApiKey,
    ) -> Result<(), KakaoError> {
        let csrf = session.csrf_token().ok_or(KakaoError::PickerRequired)?;

        let body = SendRequest {
            validated_talk_link: link,
            security_key: &directory.security_key,
            receiver_type: "chat",
            receiver_ids: [&target.id],
            receiver_chat_room_member_count: [target.member_count],
        };

        let res = self
            .with_picker_headers(self.post(SEND_PATH, session), &csrf.0, &api_key.0)
            // `json` keeps a content type that's already set.
            .header(CONTENT_TYPE, "application/json;charset=utf-8")
            .json(&body)
            .send()
            .await
            .map_err(|e| KakaoError::network(Step::Send, e))?;

        if !res.status().is_success() {
            return Err(KakaoError::Network(
                Step::Send,
                NetworkFailure::Status(res.status()),
            ));
        }

        session.merge_response_cookies(res.headers());

        Ok(())
    }
}
