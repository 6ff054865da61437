use std::sync::Arc;
use tokio::time::Duration;

use crate::message::Message;
use crate::pictures::PictureStore;
use crate::session::SessionStore;
use crate::users::{CredentialVerifier, UserDirectory};

/// Everything a handler may touch, bundled so the dispatcher can be handed
/// its collaborators instead of reaching for globals. Tests substitute
/// in-memory implementations through the same seam.
#[derive(Clone)]
pub struct Services {
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserDirectory>,
    pub pictures: Arc<dyn PictureStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    /// Lifetime of a session opened by login. Fixed at creation; never
    /// refreshed afterwards.
    pub session_ttl: Duration,
}

pub trait Executable {
    fn exec(self, services: &Services) -> crate::Result<Message>;
}
