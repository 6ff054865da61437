use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::time::Duration;

use userd::api::executable::Services;
use userd::backend;
use userd::pictures::{DirPictureStore, MemoryPictureStore, PictureStore};
use userd::session::MemorySessionStore;
use userd::users::{MemoryUserDirectory, PlainTextVerifier, UserRecord};
use userd::Error;

const PORT: u16 = 8080;
const SESSION_TTL_SECS: u64 = 120;

#[derive(Parser, Debug)]
struct Args {
    /// The port to listen on
    #[arg(short, long, default_value_t = PORT)]
    port: u16,

    /// Seconds a login session stays valid
    #[arg(long, default_value_t = SESSION_TTL_SECS)]
    session_ttl_secs: u64,

    /// Directory for uploaded pictures; kept in memory when unset
    #[arg(long)]
    picture_dir: Option<PathBuf>,

    /// Seed a user as name:password:nickname; repeatable
    #[arg(long = "user", value_parser = parse_user)]
    users: Vec<(String, String, String)>,
}

fn parse_user(raw: &str) -> Result<(String, String, String), String> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(password), Some(nickname)) if !name.is_empty() => Ok((
            name.to_string(),
            password.to_string(),
            nickname.to_string(),
        )),
        _ => Err(format!("expected name:password:nickname, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let users = MemoryUserDirectory::new();
    for (name, password, nickname) in args.users {
        users.insert(name, UserRecord { password, nickname });
    }

    let pictures: Arc<dyn PictureStore> = match args.picture_dir {
        Some(dir) => Arc::new(DirPictureStore::new(dir)?),
        None => Arc::new(MemoryPictureStore::new()),
    };

    let services = Services {
        sessions: Arc::new(MemorySessionStore::new()),
        users: Arc::new(users),
        pictures,
        credentials: Arc::new(PlainTextVerifier),
        session_ttl: Duration::from_secs(args.session_ttl_secs),
    };

    backend::run(args.port, services).await
}
