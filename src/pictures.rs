use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use bytes::Bytes;

/// Byte-blob capability for profile pictures, keyed by username. Blobs are
/// opaque: stored and returned verbatim, delimiter bytes and all.
pub trait PictureStore: Send + Sync + 'static {
    fn get(&self, username: &str) -> crate::Result<Option<Bytes>>;
    fn put(&self, username: &str, data: Bytes) -> crate::Result<()>;
}

#[derive(Default)]
pub struct MemoryPictureStore {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl MemoryPictureStore {
    pub fn new() -> MemoryPictureStore {
        MemoryPictureStore::default()
    }
}

impl PictureStore for MemoryPictureStore {
    fn get(&self, username: &str) -> crate::Result<Option<Bytes>> {
        Ok(self.blobs.lock().unwrap().get(username).cloned())
    }

    fn put(&self, username: &str, data: Bytes) -> crate::Result<()> {
        self.blobs.lock().unwrap().insert(username.to_string(), data);
        Ok(())
    }
}

/// Filesystem-backed [`PictureStore`]: one file per username under a single
/// directory.
pub struct DirPictureStore {
    dir: PathBuf,
}

impl DirPictureStore {
    pub fn new(dir: impl Into<PathBuf>) -> crate::Result<DirPictureStore> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(DirPictureStore { dir })
    }

    // Usernames become file names; one that names a path would escape the
    // store directory.
    fn path_for(&self, username: &str) -> crate::Result<PathBuf> {
        if username.is_empty()
            || username == "."
            || username == ".."
            || username.contains(['/', '\\'])
        {
            return Err(format!("invalid picture key: {username:?}").into());
        }
        Ok(self.dir.join(username))
    }
}

impl PictureStore for DirPictureStore {
    fn get(&self, username: &str) -> crate::Result<Option<Bytes>> {
        match std::fs::read(self.path_for(username)?) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, username: &str, data: Bytes) -> crate::Result<()> {
        std::fs::write(self.path_for(username)?, &data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryPictureStore::new();

        assert_eq!(store.get("alice").unwrap(), None);

        store.put("alice", Bytes::from_static(b"v1")).unwrap();
        store.put("alice", Bytes::from_static(b"v2")).unwrap();

        assert_eq!(store.get("alice").unwrap(), Some(Bytes::from_static(b"v2")));
    }

    #[test]
    fn dir_store_round_trips_binary_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirPictureStore::new(dir.path()).unwrap();

        let blob = Bytes::from_static(b"\x89PNG;\x00\xffrest");
        store.put("alice", blob.clone()).unwrap();

        assert_eq!(store.get("alice").unwrap(), Some(blob));
        assert_eq!(store.get("bob").unwrap(), None);
    }

    #[test]
    fn dir_store_rejects_path_like_usernames() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirPictureStore::new(dir.path()).unwrap();

        assert!(store.put("../escape", Bytes::from_static(b"x")).is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.put("", Bytes::new()).is_err());
    }
}
