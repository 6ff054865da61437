pub mod api;
pub mod backend;
pub mod client;
pub mod codec;
pub mod message;
pub mod pictures;
pub mod protocol;
pub mod session;
pub mod users;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
