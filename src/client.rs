use bytes::Bytes;
use tokio::net::TcpStream;

use crate::api::{self, Op};
use crate::message::Message;
use crate::protocol;

/// Typed front door to the backend, one method per operation. Every call
/// dials a fresh connection, performs a single request/response exchange
/// and lets the connection drop. Connections are never reused; that is a
/// visible property of the protocol, not an implementation detail.
///
/// Responses come back as the raw [`Message`]; callers read `__ret__` and
/// the operation's fields themselves, the way the web tier does.
pub struct Client {
    addr: String,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Client {
        Client { addr: addr.into() }
    }

    pub async fn login(&self, username: &str, password: &str) -> crate::Result<Message> {
        self.call(Message::from([
            (api::API, Op::Login.as_ref()),
            ("username", username),
            ("password", password),
        ]))
        .await
    }

    pub async fn info(&self, session: &str) -> crate::Result<Message> {
        self.call(Message::from([
            (api::API, Op::Info.as_ref()),
            ("session", session),
        ]))
        .await
    }

    pub async fn update_nickname(&self, session: &str, nickname: &str) -> crate::Result<Message> {
        self.call(Message::from([
            (api::API, Op::UpdateNickname.as_ref()),
            ("session", session),
            ("nickname", nickname),
        ]))
        .await
    }

    pub async fn get_picture(&self, session: &str) -> crate::Result<Message> {
        self.call(Message::from([
            (api::API, Op::GetPicture.as_ref()),
            ("session", session),
        ]))
        .await
    }

    pub async fn upload_picture(&self, session: &str, picture: Bytes) -> crate::Result<Message> {
        let mut req = Message::from([
            (api::API, Op::UploadPicture.as_ref()),
            ("session", session),
        ]);
        req.insert("picture", picture);
        self.call(req).await
    }

    /// Send an arbitrary request message. The typed methods above all come
    /// through here; it is also the escape hatch for unrecognized tags.
    pub async fn call(&self, req: Message) -> crate::Result<Message> {
        let stream = TcpStream::connect(&self.addr).await?;
        protocol::request(stream, req).await
    }
}
