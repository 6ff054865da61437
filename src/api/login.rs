use bytes::Bytes;
use uuid::Uuid;

use crate::api::executable::{Executable, Services};
use crate::api::{failure, RET, RET_OK};
use crate::message::Message;
use crate::session::SessionFields;

/// Check `username`/`password` against the user directory and open a
/// session on success. The response carries the fresh session token; every
/// kind of rejection is the same bare failure code.
#[derive(Debug, PartialEq)]
pub struct Login {
    pub username: String,
    pub password: Bytes,
}

impl From<&Message> for Login {
    fn from(req: &Message) -> Self {
        Login {
            username: req.get_str("username").unwrap_or_default().to_string(),
            password: req.get("password").cloned().unwrap_or_default(),
        }
    }
}

impl Executable for Login {
    fn exec(self, services: &Services) -> crate::Result<Message> {
        let Some(user) = services.users.lookup(&self.username)? else {
            return Ok(failure());
        };
        if !services.credentials.verify(&self.password, &user.password) {
            return Ok(failure());
        }

        let token = Uuid::new_v4().to_string();
        let fields = SessionFields::from([
            ("username".to_string(), self.username),
            ("nickname".to_string(), user.nickname),
        ]);
        services
            .sessions
            .create_or_replace(token.clone(), fields, services.session_ttl);

        Ok(Message::from([(RET, RET_OK), ("session", token.as_str())]))
    }
}
