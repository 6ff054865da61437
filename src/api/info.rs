use crate::api::executable::{Executable, Services};
use crate::api::{failure, session_fields, RET, RET_OK};
use crate::message::Message;

/// Return the `username` and `nickname` held by a live session. The answer
/// comes from the session record itself, not from the user directory, so a
/// nickname change is only visible here once updatenickname has written it
/// into the session.
#[derive(Debug, PartialEq)]
pub struct Info {
    pub session: String,
}

impl From<&Message> for Info {
    fn from(req: &Message) -> Self {
        Info {
            session: req.get_str("session").unwrap_or_default().to_string(),
        }
    }
}

impl Executable for Info {
    fn exec(self, services: &Services) -> crate::Result<Message> {
        let Some(fields) = session_fields(services, &self.session) else {
            return Ok(failure());
        };

        Ok(Message::from([
            (RET, RET_OK),
            (
                "username",
                fields.get("username").map(String::as_str).unwrap_or_default(),
            ),
            (
                "nickname",
                fields.get("nickname").map(String::as_str).unwrap_or_default(),
            ),
        ]))
    }
}
