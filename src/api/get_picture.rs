use crate::api::executable::{Executable, Services};
use crate::api::{failure, session_fields, RET, RET_OK};
use crate::message::Message;

/// Fetch the profile picture of the user behind a live session. The blob is
/// keyed by username, never by token, so it survives session expiry.
#[derive(Debug, PartialEq)]
pub struct GetPicture {
    pub session: String,
}

impl From<&Message> for GetPicture {
    fn from(req: &Message) -> Self {
        GetPicture {
            session: req.get_str("session").unwrap_or_default().to_string(),
        }
    }
}

impl Executable for GetPicture {
    fn exec(self, services: &Services) -> crate::Result<Message> {
        let Some(fields) = session_fields(services, &self.session) else {
            return Ok(failure());
        };
        let username = fields.get("username").map(String::as_str).unwrap_or_default();

        match services.pictures.get(username)? {
            Some(picture) => {
                let mut res = Message::from([(RET, RET_OK)]);
                res.insert("picture", picture);
                Ok(res)
            }
            None => Ok(failure()),
        }
    }
}
