pub mod executable;
pub mod get_picture;
pub mod info;
pub mod login;
pub mod update_nickname;
pub mod upload_picture;

use std::str::FromStr;

use strum_macros::{AsRefStr, EnumString};

use crate::message::Message;
use crate::session::SessionFields;

use executable::{Executable, Services};
use get_picture::GetPicture;
use info::Info;
use login::Login;
use update_nickname::UpdateNickname;
use upload_picture::UploadPicture;

/// Field key carrying the operation tag.
pub const API: &str = "__api__";
/// Field key carrying the outcome: [`RET_OK`] or [`RET_FAIL`].
pub const RET: &str = "__ret__";

pub const RET_OK: &str = "0";
pub const RET_FAIL: &str = "1";

// The protocol never enumerates failure reasons over the wire; bad
// credentials, a dead session and a missing picture all look the same to
// the caller.
pub(crate) fn failure() -> Message {
    Message::from([(RET, RET_FAIL)])
}

// Exists-probe first, then the full read, matching the access pattern the
// session store contract is written for.
pub(crate) fn session_fields(services: &Services, token: &str) -> Option<SessionFields> {
    if !services.sessions.exists(token) {
        return None;
    }
    services.sessions.get_all(token)
}

/// The operation tags a request may carry in its [`API`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum Op {
    #[strum(serialize = "login")]
    Login,
    #[strum(serialize = "info")]
    Info,
    #[strum(serialize = "updatenickname")]
    UpdateNickname,
    #[strum(serialize = "getpic")]
    GetPicture,
    #[strum(serialize = "uploadpic")]
    UploadPicture,
}

/// A decoded request, routed by operation tag. Parsing never fails: a
/// missing or unrecognized tag becomes [`Request::Unknown`], and missing
/// fields read as empty values that fall through the normal lookup paths.
#[derive(Debug, PartialEq)]
pub enum Request {
    Login(Login),
    Info(Info),
    UpdateNickname(UpdateNickname),
    GetPicture(GetPicture),
    UploadPicture(UploadPicture),
    Unknown,
}

impl From<&Message> for Request {
    fn from(req: &Message) -> Self {
        let Some(op) = req.get_str(API).and_then(|tag| Op::from_str(tag).ok()) else {
            return Request::Unknown;
        };

        match op {
            Op::Login => Request::Login(Login::from(req)),
            Op::Info => Request::Info(Info::from(req)),
            Op::UpdateNickname => Request::UpdateNickname(UpdateNickname::from(req)),
            Op::GetPicture => Request::GetPicture(GetPicture::from(req)),
            Op::UploadPicture => Request::UploadPicture(UploadPicture::from(req)),
        }
    }
}

impl Executable for Request {
    fn exec(self, services: &Services) -> crate::Result<Message> {
        match self {
            Request::Login(handler) => handler.exec(services),
            Request::Info(handler) => handler.exec(services),
            Request::UpdateNickname(handler) => handler.exec(services),
            Request::GetPicture(handler) => handler.exec(services),
            Request::UploadPicture(handler) => handler.exec(services),
            // An unrecognized operation answers with an empty message, not
            // an error; the exchange still completes normally.
            Request::Unknown => Ok(Message::new()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use tokio::time::Duration;

    use super::executable::{Executable, Services};
    use super::login::Login;
    use crate::pictures::MemoryPictureStore;
    use crate::session::MemorySessionStore;
    use crate::users::{MemoryUserDirectory, PlainTextVerifier, UserRecord};

    /// Services over in-memory capabilities, seeded with the canonical test
    /// user `alice` / `p1` / `Al`.
    pub(crate) fn services() -> Services {
        let users = MemoryUserDirectory::new();
        users.insert(
            "alice",
            UserRecord {
                password: "p1".to_string(),
                nickname: "Al".to_string(),
            },
        );

        Services {
            sessions: Arc::new(MemorySessionStore::new()),
            users: Arc::new(users),
            pictures: Arc::new(MemoryPictureStore::new()),
            credentials: Arc::new(PlainTextVerifier),
            session_ttl: Duration::from_secs(120),
        }
    }

    /// Log alice in and return her session token.
    pub(crate) fn login_alice(services: &Services) -> String {
        let res = Login {
            username: "alice".to_string(),
            password: "p1".into(),
        }
        .exec(services)
        .unwrap();

        res.get_str("session").unwrap().to_string()
    }
}
