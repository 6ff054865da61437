use std::collections::HashMap;
use std::sync::Mutex;

/// A stored user, keyed externally by username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub password: String,
    pub nickname: String,
}

/// Lookup/update capability over the persistent user records. The backend
/// does not own this data; a production deployment points this at a real
/// database.
pub trait UserDirectory: Send + Sync + 'static {
    fn lookup(&self, username: &str) -> crate::Result<Option<UserRecord>>;

    /// Update a user's nickname. Updating an unknown username is a silent
    /// no-op (an UPDATE that matches zero rows).
    fn set_nickname(&self, username: &str, nickname: &str) -> crate::Result<()>;
}

/// Decides whether a presented credential matches the stored one. Login
/// logic only ever sees the yes/no answer, so swapping plaintext comparison
/// for hash-and-compare is a one-struct change.
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify(&self, candidate: &[u8], stored: &str) -> bool;
}

/// Exact byte equality against the stored password. This mirrors the
/// historical behavior of the service; it is not timing-safe and stores
/// credentials in the clear.
pub struct PlainTextVerifier;

impl CredentialVerifier for PlainTextVerifier {
    fn verify(&self, candidate: &[u8], stored: &str) -> bool {
        candidate == stored.as_bytes()
    }
}

/// Map-backed [`UserDirectory`] for tests and for seeding a demo instance
/// from the command line.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserDirectory {
    pub fn new() -> MemoryUserDirectory {
        MemoryUserDirectory::default()
    }

    pub fn insert(&self, username: impl Into<String>, record: UserRecord) {
        self.users.lock().unwrap().insert(username.into(), record);
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn lookup(&self, username: &str) -> crate::Result<Option<UserRecord>> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    fn set_nickname(&self, username: &str, nickname: &str) -> crate::Result<()> {
        if let Some(record) = self.users.lock().unwrap().get_mut(username) {
            record.nickname = nickname.to_string();
        }
        Ok(())
    }
}
