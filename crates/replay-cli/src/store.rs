//! Filesystem-backed document store.
//!
//! A stand-in for the hosted document database the listening aggregates
//! live in: one JSON file per document, addressed by `{collection}/{id}`
//! paths. `fetch` is a point-in-time read; `subscribe` delivers each
//! addressed document's current snapshot over a channel, one at a time,
//! the way the real store's snapshot feed pushes them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use replay_core::DocPath;
use tokio::sync::mpsc;

/// Capacity of the snapshot feed channel.
const FEED_CAPACITY: usize = 16;

/// One pushed snapshot: the document's address and its current body,
/// `None` when the store holds no document at that address.
pub type FeedItem = (DocPath, Result<Option<serde_json::Value>>);

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn file_for(&self, path: &DocPath) -> PathBuf {
        self.root
            .join(path.collection())
            .join(format!("{}.json", path.doc_id()))
    }

    /// Fetches one document. A missing file is `Ok(None)`: an absent
    /// document is the zero state, not an error.
    pub async fn fetch(&self, path: &DocPath) -> Result<Option<serde_json::Value>> {
        let file = self.file_for(path);
        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(%path, "no document in store");
                return Ok(None);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", file.display()));
            }
        };
        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid JSON in {}", file.display()))?;
        Ok(Some(value))
    }

    /// Subscribes to a set of documents: a reader task pushes each
    /// document's current snapshot over the returned channel, then the
    /// channel closes. Dropping the receiver cancels the feed.
    #[must_use]
    pub fn subscribe(&self, paths: Vec<DocPath>) -> mpsc::Receiver<FeedItem> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let store = self.clone();
        tokio::spawn(async move {
            for path in paths {
                let snapshot = store.fetch(&path).await;
                if tx.send((path, snapshot)).await.is_err() {
                    tracing::debug!("feed receiver dropped, cancelling subscription");
                    return;
                }
            }
        });
        rx
    }
}
