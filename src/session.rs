use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio::time::{sleep_until, Duration, Instant};

/// The field set attached to a live session. At minimum `username` and
/// `nickname`.
pub type SessionFields = HashMap<String, String>;

/// Storage capability for session records, keyed by an opaque token. The
/// dispatcher owns no session state of its own; the token is the only handle
/// it ever holds.
///
/// Every operation on an unknown token behaves as "record absent" rather
/// than erroring. The TTL is fixed when the record is created; reads and
/// field updates never extend it (touching a session does not keep it
/// alive).
pub trait SessionStore: Send + Sync + 'static {
    fn exists(&self, token: &str) -> bool;
    fn create_or_replace(&self, token: String, fields: SessionFields, ttl: Duration);
    fn get_all(&self, token: &str) -> Option<SessionFields>;
    fn set_field(&self, token: &str, name: &str, value: &str);
}

/// In-memory [`SessionStore`] with automatic expiry. Records live in a
/// mutex-guarded map next to a sorted deadline index; a background task
/// sleeps until the nearest deadline and removes whatever has lapsed. The
/// store is cheap to clone and safe to share across connection tasks.
#[derive(Clone)]
pub struct MemorySessionStore {
    inner: Arc<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> MemorySessionStore {
        let state = State {
            records: HashMap::new(),
            deadlines: BTreeSet::new(),
        };

        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            waker: Notify::new(),
        });

        tokio::spawn({
            let inner = inner.clone();
            async move { purge_expired(inner).await }
        });

        Self { inner }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn exists(&self, token: &str) -> bool {
        self.inner.lock().state.records.contains_key(token)
    }

    fn create_or_replace(&self, token: String, fields: SessionFields, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        let mut locked = self.inner.lock();

        let record = Record { fields, expires_at };
        if let Some(old) = locked.state.records.insert(token.clone(), record) {
            // Drop the replaced record's deadline, otherwise a shorter
            // earlier TTL would expire the new record ahead of time.
            locked.state.deadlines.remove(&(old.expires_at, token.clone()));
        }
        locked.state.deadlines.insert((expires_at, token.clone()));

        let next_to_expire = locked.state.deadlines.iter().next().map(|(_, t)| t);
        let expires_next = next_to_expire == Some(&token);
        if expires_next {
            locked.waker.notify_one();
        }
    }

    fn get_all(&self, token: &str) -> Option<SessionFields> {
        self.inner
            .lock()
            .state
            .records
            .get(token)
            .map(|record| record.fields.clone())
    }

    fn set_field(&self, token: &str, name: &str, value: &str) {
        if let Some(record) = self.inner.lock().state.records.get_mut(token) {
            record.fields.insert(name.to_string(), value.to_string());
        }
    }
}

struct Inner {
    state: Mutex<State>,
    waker: Notify,
}

struct State {
    records: HashMap<String, Record>,
    deadlines: BTreeSet<(Instant, String)>,
}

struct Record {
    fields: SessionFields,
    expires_at: Instant,
}

struct Locked<'a> {
    state: MutexGuard<'a, State>,
    waker: &'a Notify,
}

impl Inner {
    fn lock(&self) -> Locked<'_> {
        Locked {
            state: self.state.lock().unwrap(),
            waker: &self.waker,
        }
    }
}

impl Locked<'_> {
    fn remove_expired(&mut self) -> Option<Instant> {
        let now = Instant::now();

        let expired: Vec<(Instant, String)> = self
            .state
            .deadlines
            .iter()
            .take_while(|(expires_at, _)| expires_at <= &now)
            .cloned()
            .collect();

        for (when, token) in expired {
            self.state.records.remove(&token);
            self.state.deadlines.remove(&(when, token));
        }

        self.state
            .deadlines
            .iter()
            .next()
            .map(|&(expires_at, _)| expires_at)
    }
}

async fn purge_expired(inner: Arc<Inner>) {
    loop {
        let (next_deadline, waker) = {
            let mut locked = inner.lock();
            let next_deadline = locked.remove_expired();
            (next_deadline, locked.waker)
        };

        if let Some(next_deadline) = next_deadline {
            tokio::select! {
                _ = sleep_until(next_deadline) => {}
                _ = waker.notified() => {}
            }
        } else {
            waker.notified().await;
        }
    }
}
