use super::{room::RoomTitle, scrape::ExtractionError};
use reqwest::StatusCode;
use std::fmt;

/// Which of the three sharer calls a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Picker,
    Rooms,
    Send,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            Step::Picker => "picker",
            Step::Rooms => "room directory",
            Step::Send => "send",
        };

        write!(f, "{}", x)
    }
}

/// What went wrong on the wire. Timeouts are kept apart from other transport
/// errors so that a hung upstream is recognisable in the logs.
#[derive(Debug)]
pub enum NetworkFailure {
    TimedOut(reqwest::Error),
    Transport(reqwest::Error),
    Status(StatusCode),
}

impl From<reqwest::Error> for NetworkFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkFailure::TimedOut(e)
        } else {
            NetworkFailure::Transport(e)
        }
    }
}

/// Sum type representing every possible unexceptional fail state of a link
/// send. Each variant identifies the stage that failed.
#[derive(Debug)]
pub enum KakaoError {
    Auth(String),
    Network(Step, NetworkFailure),
    Extraction(ExtractionError),
    Protocol(Step, serde_json::Error),
    RoomNotFound(RoomTitle),
    /// A room or send call was attempted before any picker call stored a CSRF
    /// token in the session.
    PickerRequired,
}

impl KakaoError {
    /// Tag a transport error with the step it occurred in.
    pub fn network(step: Step, e: reqwest::Error) -> Self {
        KakaoError::Network(step, e.into())
    }
}

impl From<ExtractionError> for KakaoError {
    fn from(e: ExtractionError) -> Self {
        KakaoError::Extraction(e)
    }
}

impl fmt::Display for KakaoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            KakaoError::Auth(e) => format!("Kakao login failed: {}", e),
            KakaoError::Network(s, NetworkFailure::TimedOut(_)) => {
                format!("Kakao {} request timed out", s)
            }
            KakaoError::Network(s, NetworkFailure::Transport(e)) => {
                format!("Kakao {} request failed: {:?}", s, e)
            }
            KakaoError::Network(s, NetworkFailure::Status(c)) => {
                format!("Kakao {} request returned {}", s, c)
            }
            KakaoError::Extraction(e) => format!("Could not read picker page: {}", e),
            KakaoError::Protocol(s, e) => format!("Kakao {} response was malformed: {}", s, e),
            KakaoError::RoomNotFound(r) => format!("Unknown Kakao room: {}", r),
            KakaoError::PickerRequired => "No CSRF token; picker call required first.".into(),
        };

        write!(f, "{}", x)
    }
}
