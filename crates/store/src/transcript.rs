//! Append-only JSONL transcripts, one per diagnosis.
//!
//! Every message is appended as a single JSON line to
//! `diagnoses/<id>/messages.jsonl`. The store assigns message ids and
//! timestamps at persistence time; appends to the same diagnosis serialize
//! through a per-diagnosis lock held across timestamp assignment, the disk
//! append, and the cache push, so the log is monotonically non-decreasing
//! per diagnosis with insertion order breaking ties. No edits, no deletes.
//!
//! Includes an in-memory write-through cache to avoid re-reading from disk
//! every turn, and async wrappers that run file I/O on blocking threads.
//! Reads are never serialized against appends; they see some append-order
//! prefix of the transcript.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use ll_domain::error::{Error, Result};
use ll_domain::model::{Message, Sender};
use ll_domain::trace::TraceEvent;

/// File-backed transcript store with a write-through cache.
pub struct TranscriptStore {
    inner: Arc<Inner>,
}

struct Inner {
    base_dir: PathBuf,
    cache: RwLock<HashMap<String, Vec<Message>>>,
    /// One lock per diagnosis, held for the whole of an append so two
    /// concurrent appends cannot interleave between the timestamp clamp
    /// and the write.
    append_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TranscriptStore {
    /// Create the store rooted at `data_path/diagnoses`.
    pub fn new(data_path: &Path) -> Result<Self> {
        let base_dir = data_path.join("diagnoses");
        std::fs::create_dir_all(&base_dir).map_err(Error::Io)?;
        Ok(Self {
            inner: Arc::new(Inner {
                base_dir,
                cache: RwLock::new(HashMap::new()),
                append_locks: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Append one message and return the persisted record.
    ///
    /// The disk write happens before the cache update, so the cache never
    /// claims a message that was not durably appended.
    pub fn append(
        &self,
        diagnosis_id: &str,
        sender: Sender,
        content: &str,
    ) -> Result<Message> {
        self.inner.append(diagnosis_id, sender, content)
    }

    /// Append one message (async).  The whole serialized append, file I/O
    /// included, runs on a blocking thread.
    pub async fn append_async(
        &self,
        diagnosis_id: &str,
        sender: Sender,
        content: &str,
    ) -> Result<Message> {
        let inner = Arc::clone(&self.inner);
        let id = diagnosis_id.to_owned();
        let content = content.to_owned();
        tokio::task::spawn_blocking(move || inner.append(&id, sender, &content))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }

    /// Read a full transcript in chronological order. Returns cached
    /// messages if available, otherwise loads from disk and populates the
    /// cache. A diagnosis with no transcript yet reads as empty.
    pub fn read(&self, diagnosis_id: &str) -> Result<Vec<Message>> {
        self.inner.read(diagnosis_id)
    }

    /// Read a full transcript (async).
    pub async fn read_async(&self, diagnosis_id: &str) -> Result<Vec<Message>> {
        {
            let cache = self.inner.cache.read();
            if let Some(messages) = cache.get(diagnosis_id) {
                return Ok(messages.clone());
            }
        }

        let inner = Arc::clone(&self.inner);
        let id = diagnosis_id.to_owned();
        tokio::task::spawn_blocking(move || inner.read(&id))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }

    /// The most recent `n` messages, returned in chronological order.
    pub async fn last_n(&self, diagnosis_id: &str, n: usize) -> Result<Vec<Message>> {
        let messages = self.read_async(diagnosis_id).await?;
        let start = messages.len().saturating_sub(n);
        Ok(messages[start..].to_vec())
    }
}

impl Inner {
    fn append(
        &self,
        diagnosis_id: &str,
        sender: Sender,
        content: &str,
    ) -> Result<Message> {
        if content.is_empty() {
            return Err(Error::Validation(
                "message content must be non-empty".into(),
            ));
        }

        let lock = self.append_lock(diagnosis_id);
        let _serialized = lock.lock();

        // Warm the cache so the clamp sees the last persisted timestamp
        // and the push below extends the full transcript.
        self.load_into_cache(diagnosis_id)?;

        let mut timestamp = Utc::now();
        if let Some(last) = self.last_timestamp(diagnosis_id) {
            if timestamp < last {
                timestamp = last;
            }
        }

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            content: content.to_owned(),
            timestamp,
        };

        let buf = serialize_line(&message)?;
        append_to_file(&self.file_path(diagnosis_id), &buf)?;

        self.cache
            .write()
            .entry(diagnosis_id.to_owned())
            .or_default()
            .push(message.clone());

        TraceEvent::TranscriptAppend {
            diagnosis_id: diagnosis_id.to_owned(),
            sender: sender_tag(sender).to_owned(),
        }
        .emit();

        Ok(message)
    }

    fn read(&self, diagnosis_id: &str) -> Result<Vec<Message>> {
        {
            let cache = self.cache.read();
            if let Some(messages) = cache.get(diagnosis_id) {
                return Ok(messages.clone());
            }
        }

        self.load_into_cache(diagnosis_id)?;
        Ok(self
            .cache
            .read()
            .get(diagnosis_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Populate the cache entry from disk if absent. An existing entry is
    /// kept as-is: once a diagnosis is cached, the cache is authoritative.
    fn load_into_cache(&self, diagnosis_id: &str) -> Result<()> {
        if self.cache.read().contains_key(diagnosis_id) {
            return Ok(());
        }
        let messages = read_jsonl_file(&self.file_path(diagnosis_id), diagnosis_id)?;
        self.cache
            .write()
            .entry(diagnosis_id.to_owned())
            .or_insert(messages);
        Ok(())
    }

    fn last_timestamp(&self, diagnosis_id: &str) -> Option<DateTime<Utc>> {
        let cache = self.cache.read();
        cache
            .get(diagnosis_id)
            .and_then(|messages| messages.last())
            .map(|m| m.timestamp)
    }

    fn append_lock(&self, diagnosis_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.append_locks.lock();
        Arc::clone(locks.entry(diagnosis_id.to_owned()).or_default())
    }

    fn file_path(&self, diagnosis_id: &str) -> PathBuf {
        self.base_dir.join(diagnosis_id).join("messages.jsonl")
    }
}

fn sender_tag(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Assistant => "assistant",
    }
}

fn serialize_line(message: &Message) -> Result<String> {
    let mut buf = serde_json::to_string(message)
        .map_err(|e| Error::Other(format!("serializing message: {e}")))?;
    buf.push('\n');
    Ok(buf)
}

fn append_to_file(path: &Path, buf: &str) -> Result<()> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(Error::Io)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(Error::Io)?;
    file.write_all(buf.as_bytes()).map_err(Error::Io)?;
    Ok(())
}

/// Read and parse a JSONL transcript file.
fn read_jsonl_file(path: &Path, diagnosis_id: &str) -> Result<Vec<Message>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut messages = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Message>(line) {
            Ok(m) => messages.push(m),
            Err(e) => {
                tracing::warn!(
                    diagnosis_id = diagnosis_id,
                    error = %e,
                    "skipping malformed transcript line"
                );
            }
        }
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path()).unwrap();

        store.append("d1", Sender::Assistant, "hello").unwrap();
        store.append("d1", Sender::User, "hi").unwrap();
        store.append("d1", Sender::Assistant, "how can I help?").unwrap();

        let messages = store.read("d1").unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].sender, Sender::Assistant);
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[2].content, "how can I help?");
    }

    #[test]
    fn timestamps_never_decrease() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path()).unwrap();

        for i in 0..20 {
            store
                .append("d1", Sender::User, &format!("msg {i}"))
                .unwrap();
        }

        let messages = store.read("d1").unwrap();
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_timestamps_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TranscriptStore::new(dir.path()).unwrap());

        for round in 0..50 {
            let mut handles = Vec::new();
            for i in 0..8 {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    store
                        .append_async("d1", Sender::User, &format!("r{round} m{i}"))
                        .await
                        .unwrap();
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }
        }

        let messages = store.read("d1").unwrap();
        assert_eq!(messages.len(), 400);
        for pair in messages.windows(2) {
            assert!(
                pair[0].timestamp <= pair[1].timestamp,
                "{} after {}",
                pair[0].timestamp,
                pair[1].timestamp
            );
        }

        // Cache and disk agree on the order.
        let fresh = TranscriptStore::new(dir.path()).unwrap();
        let reloaded = fresh.read("d1").unwrap();
        assert_eq!(reloaded.len(), 400);
        for (a, b) in messages.iter().zip(&reloaded) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn transcripts_are_isolated_per_diagnosis() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path()).unwrap();

        store.append("d1", Sender::User, "for d1").unwrap();
        store.append("d2", Sender::User, "for d2").unwrap();

        assert_eq!(store.read("d1").unwrap().len(), 1);
        assert_eq!(store.read("d2").unwrap().len(), 1);
        assert_eq!(store.read("d1").unwrap()[0].content, "for d1");
    }

    #[test]
    fn empty_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path()).unwrap();

        let err = store.append("d1", Sender::User, "").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.read("d1").unwrap().is_empty());
    }

    #[test]
    fn read_survives_cold_cache() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = TranscriptStore::new(dir.path()).unwrap();
            store.append("d1", Sender::Assistant, "persisted").unwrap();
        }

        let store = TranscriptStore::new(dir.path()).unwrap();
        let messages = store.read("d1").unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "persisted");
    }

    #[test]
    fn append_on_cold_cache_extends_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = TranscriptStore::new(dir.path()).unwrap();
            store.append("d1", Sender::Assistant, "first").unwrap();
        }

        let store = TranscriptStore::new(dir.path()).unwrap();
        store.append("d1", Sender::User, "second").unwrap();

        let messages = store.read("d1").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
    }

    #[tokio::test]
    async fn last_n_returns_most_recent_chronologically() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path()).unwrap();

        for i in 0..15 {
            store
                .append_async("d1", Sender::User, &format!("msg {i}"))
                .await
                .unwrap();
        }

        let last = store.last_n("d1", 10).await.unwrap();
        assert_eq!(last.len(), 10);
        assert_eq!(last[0].content, "msg 5");
        assert_eq!(last[9].content, "msg 14");

        // Shorter transcripts come back whole.
        let all = store.last_n("d1", 100).await.unwrap();
        assert_eq!(all.len(), 15);
    }
}
