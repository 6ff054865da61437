use bytes::Bytes;

use crate::api::executable::{Executable, Services};
use crate::api::{failure, session_fields, RET, RET_OK};
use crate::message::Message;

/// Store or overwrite the profile picture of the user behind a live
/// session. The picture travels as a raw byte value; nothing about its
/// content is inspected.
#[derive(Debug, PartialEq)]
pub struct UploadPicture {
    pub session: String,
    pub picture: Bytes,
}

impl From<&Message> for UploadPicture {
    fn from(req: &Message) -> Self {
        UploadPicture {
            session: req.get_str("session").unwrap_or_default().to_string(),
            picture: req.get("picture").cloned().unwrap_or_default(),
        }
    }
}

impl Executable for UploadPicture {
    fn exec(self, services: &Services) -> crate::Result<Message> {
        let Some(fields) = session_fields(services, &self.session) else {
            return Ok(failure());
        };
        let username = fields.get("username").map(String::as_str).unwrap_or_default();

        services.pictures.put(username, self.picture)?;

        Ok(Message::from([(RET, RET_OK)]))
    }
}
