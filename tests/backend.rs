use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

use userd::api::executable::Services;
use userd::api::{API, RET};
use userd::backend::run;
use userd::client::Client;
use userd::message::Message;
use userd::pictures::MemoryPictureStore;
use userd::session::MemorySessionStore;
use userd::users::{MemoryUserDirectory, PlainTextVerifier, UserRecord};

// Each test runs its own backend on a private port so they can execute in
// parallel.
async fn start_backend(port: u16, session_ttl: Duration) -> Client {
    let users = MemoryUserDirectory::new();
    users.insert(
        "alice",
        UserRecord {
            password: "p1".to_string(),
            nickname: "Al".to_string(),
        },
    );
    users.insert(
        "bob",
        UserRecord {
            password: "hunter2".to_string(),
            nickname: "Bobby".to_string(),
        },
    );

    let services = Services {
        sessions: Arc::new(MemorySessionStore::new()),
        users: Arc::new(users),
        pictures: Arc::new(MemoryPictureStore::new()),
        credentials: Arc::new(PlainTextVerifier),
        session_ttl,
    };

    tokio::spawn(run(port, services));
    sleep(Duration::from_millis(100)).await;

    Client::new(format!("127.0.0.1:{port}"))
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let res = client.login(username, password).await.unwrap();
    assert_eq!(res.get_str(RET), Some("0"));
    res.get_str("session").unwrap().to_string()
}

#[tokio::test]
async fn login_then_info() {
    let client = start_backend(7311, Duration::from_secs(120)).await;

    let session = login(&client, "alice", "p1").await;
    assert!(!session.is_empty());

    let info = client.info(&session).await.unwrap();
    assert_eq!(info.get_str(RET), Some("0"));
    assert_eq!(info.get_str("username"), Some("alice"));
    assert_eq!(info.get_str("nickname"), Some("Al"));
}

#[tokio::test]
async fn wrong_password_yields_no_session() {
    let client = start_backend(7312, Duration::from_secs(120)).await;

    let res = client.login("alice", "wrong").await.unwrap();

    assert_eq!(res.get_str(RET), Some("1"));
    assert!(!res.contains_key("session"));
}

#[tokio::test]
async fn bogus_token_is_rejected() {
    let client = start_backend(7313, Duration::from_secs(120)).await;

    let res = client.info("not-a-real-token").await.unwrap();

    assert_eq!(res.get_str(RET), Some("1"));
}

#[tokio::test]
async fn nickname_update_is_visible_through_the_session() {
    let client = start_backend(7314, Duration::from_secs(120)).await;
    let session = login(&client, "alice", "p1").await;

    let res = client.update_nickname(&session, "Alice2").await.unwrap();
    assert_eq!(res.get_str(RET), Some("0"));

    let info = client.info(&session).await.unwrap();
    assert_eq!(info.get_str("nickname"), Some("Alice2"));

    // A later login sees the persisted nickname too.
    let fresh = login(&client, "alice", "p1").await;
    let info = client.info(&fresh).await.unwrap();
    assert_eq!(info.get_str("nickname"), Some("Alice2"));
}

#[tokio::test]
async fn picture_round_trip_preserves_binary_bytes() {
    let client = start_backend(7315, Duration::from_secs(120)).await;
    let session = login(&client, "alice", "p1").await;

    // No picture yet.
    let res = client.get_picture(&session).await.unwrap();
    assert_eq!(res.get_str(RET), Some("1"));

    // Delimiters and non-UTF-8 bytes must survive the trip untouched.
    let blob = Bytes::from_static(b"\x89PNG;\x00;\xff;payload");
    let res = client.upload_picture(&session, blob.clone()).await.unwrap();
    assert_eq!(res.get_str(RET), Some("0"));

    let res = client.get_picture(&session).await.unwrap();
    assert_eq!(res.get_str(RET), Some("0"));
    assert_eq!(res.get("picture"), Some(&blob));
}

#[tokio::test]
async fn pictures_are_private_to_each_user() {
    let client = start_backend(7316, Duration::from_secs(120)).await;
    let alice = login(&client, "alice", "p1").await;
    let bob = login(&client, "bob", "hunter2").await;

    client
        .upload_picture(&alice, Bytes::from_static(b"alice-pic"))
        .await
        .unwrap();

    let res = client.get_picture(&bob).await.unwrap();
    assert_eq!(res.get_str(RET), Some("1"));
}

#[tokio::test]
async fn unknown_operation_returns_an_empty_message() {
    let client = start_backend(7317, Duration::from_secs(120)).await;

    let res = client
        .call(Message::from([(API, "selfdestruct")]))
        .await
        .unwrap();

    assert!(res.is_empty());
    assert!(!res.contains_key(RET));
}

#[tokio::test]
async fn sessions_expire() {
    let client = start_backend(7318, Duration::from_millis(200)).await;

    let session = login(&client, "alice", "p1").await;

    let res = client.info(&session).await.unwrap();
    assert_eq!(res.get_str(RET), Some("0"));

    sleep(Duration::from_millis(400)).await;

    let res = client.info(&session).await.unwrap();
    assert_eq!(res.get_str(RET), Some("1"));
}

#[tokio::test]
async fn malformed_frame_drops_only_that_connection() {
    let client = start_backend(7319, Duration::from_secs(120)).await;

    let mut stream = TcpStream::connect("127.0.0.1:7319").await.unwrap();
    stream.write_all(b"abc;xyz").await.unwrap();

    // The backend tears the connection down without answering.
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert!(buf.is_empty());

    // The listener and later connections are unaffected.
    let session = login(&client, "alice", "p1").await;
    assert!(!session.is_empty());
}

#[tokio::test]
async fn each_request_rides_its_own_connection() {
    let client = start_backend(7320, Duration::from_secs(120)).await;
    let session = login(&client, "alice", "p1").await;

    // A handful of sequential exchanges, each on a fresh connection.
    for _ in 0..5 {
        let res = client.info(&session).await.unwrap();
        assert_eq!(res.get_str(RET), Some("0"));
    }
}
