use crate::api::executable::{Executable, Services};
use crate::api::{failure, session_fields, RET, RET_OK};
use crate::message::Message;

/// Change the nickname of the user behind a live session. Writes the user
/// directory and the session record as two independent best-effort updates;
/// there is no combined transaction across the two stores.
#[derive(Debug, PartialEq)]
pub struct UpdateNickname {
    pub session: String,
    pub nickname: String,
}

impl From<&Message> for UpdateNickname {
    fn from(req: &Message) -> Self {
        UpdateNickname {
            session: req.get_str("session").unwrap_or_default().to_string(),
            nickname: req.get_str("nickname").unwrap_or_default().to_string(),
        }
    }
}

impl Executable for UpdateNickname {
    fn exec(self, services: &Services) -> crate::Result<Message> {
        let Some(fields) = session_fields(services, &self.session) else {
            return Ok(failure());
        };
        let username = fields.get("username").map(String::as_str).unwrap_or_default();

        services.users.set_nickname(username, &self.nickname)?;
        services
            .sessions
            .set_field(&self.session, "nickname", &self.nickname);

        Ok(Message::from([(RET, RET_OK)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::info::Info;
    use crate::api::testing;

    #[tokio::test]
    async fn updates_both_the_directory_and_the_session() {
        let services = testing::services();
        let token = testing::login_alice(&services);

        let res = UpdateNickname {
            session: token.clone(),
            nickname: "Alice2".to_string(),
        }
        .exec(&services)
        .unwrap();
        assert_eq!(res.get_str(RET), Some("0"));

        // Visible through the session record...
        let info = Info { session: token }.exec(&services).unwrap();
        assert_eq!(info.get_str("nickname"), Some("Alice2"));

        // ...and persisted in the user directory.
        let record = services.users.lookup("alice").unwrap().unwrap();
        assert_eq!(record.nickname, "Alice2");
    }

    #[tokio::test]
    async fn dead_session_is_rejected() {
        let services = testing::services();

        let res = UpdateNickname {
            session: "expired".to_string(),
            nickname: "Nobody".to_string(),
        }
        .exec(&services)
        .unwrap();

        assert_eq!(res.get_str(RET), Some("1"));
        assert_eq!(
            services.users.lookup("alice").unwrap().unwrap().nickname,
            "Al".to_string()
        );
    }

    #[tokio::test]
    async fn nickname_survives_for_later_logins() {
        let services = testing::services();
        let token = testing::login_alice(&services);

        UpdateNickname {
            session: token,
            nickname: "Alice2".to_string(),
        }
        .exec(&services)
        .unwrap();

        // A fresh session snapshots the directory at login time.
        let fresh = testing::login_alice(&services);
        let info = Info { session: fresh }.exec(&services).unwrap();
        assert_eq!(info.get_str("nickname"), Some("Alice2"));
    }
}
