//! `ChannelMemory`: one similarity index per chat channel.

use crate::index::FlatIndex;
use compact_str::CompactString;
use parking_lot::RwLock;
use pcore::{Embedder, Error, ErrorKind, Message, Result, Role};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;

/// Maximum neighbours returned per query.
pub const NEIGHBOURS: usize = 20;

type Shared = Arc<Mutex<FlatIndex>>;

/// Per-channel nearest-neighbour memory over past user messages.
///
/// The map lock is held only to look up or insert a channel's index;
/// reads and writes to one index are serialized by its own mutex.
pub struct ChannelMemory<E> {
    embedder: E,
    indexes: RwLock<HashMap<CompactString, Shared>>,
}

impl<E: Embedder> ChannelMemory<E> {
    /// Create an empty memory backed by `embedder`.
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Channels that have an index.
    pub fn channels(&self) -> Vec<CompactString> {
        let mut channels = self.indexes.read().keys().cloned().collect::<Vec<_>>();
        channels.sort();
        channels
    }

    /// Number of entries indexed for `channel`.
    pub async fn len(&self, channel: &str) -> usize {
        match self.index(channel) {
            Some(index) => index.lock().await.len(),
            None => 0,
        }
    }

    fn index(&self, channel: &str) -> Option<Shared> {
        self.indexes.read().get(channel).cloned()
    }

    fn index_or_create(&self, channel: &str) -> Shared {
        if let Some(index) = self.index(channel) {
            return index;
        }
        self.indexes
            .write()
            .entry(channel.into())
            .or_default()
            .clone()
    }

    /// Embed and index `texts` for `channel`, creating its index if needed.
    ///
    /// All embeddings are computed before the index is locked. If any
    /// embedding fails or has the wrong dimension nothing is added.
    pub async fn add_texts(&self, channel: &str, texts: &[String]) -> Result<usize> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embedder.embed(text).await?);
        }

        let index = self.index_or_create(channel);
        let batch = vectors
            .into_iter()
            .zip(texts.iter().cloned())
            .collect::<Vec<_>>();
        index.lock().await.extend(batch)?;
        Ok(texts.len())
    }

    /// Record a newly seen user message. Blank text is ignored.
    pub async fn observe(&self, channel: &str, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.add_texts(channel, &[text.to_owned()]).await.map(|_| ())
    }

    /// Up to [`NEIGHBOURS`] distinct texts nearest to `query`, closest first.
    ///
    /// A channel without an index yields nothing.
    pub async fn related(&self, channel: &str, query: &str) -> Result<Vec<String>> {
        let Some(index) = self.index(channel) else {
            return Ok(Vec::new());
        };

        let vector = self.embedder.embed(query).await?;
        let index = index.lock().await;
        let hits = index.search(&vector, NEIGHBOURS)?;

        let mut related: Vec<String> = Vec::with_capacity(hits.len());
        for hit in hits {
            if !related.iter().any(|seen| seen == hit) {
                related.push(hit.to_owned());
            }
        }
        Ok(related)
    }

    /// Related texts formatted for prompt injection.
    ///
    /// Failures are logged and produce an empty string.
    pub async fn search(&self, channel: &str, query: &str) -> String {
        if self.index(channel).is_none() {
            return String::new();
        }
        match self.related(channel, query).await {
            Ok(related) => format_related(&related),
            Err(e) => {
                tracing::error!("memory search in channel {channel} failed: {e}");
                String::new()
            }
        }
    }

    /// Bulk-index the user turns of a dialogue history file.
    ///
    /// The file maps channel id to a list of `{role, content}` turns. A
    /// missing file is not an error. A channel whose texts fail to embed
    /// is logged and skipped. Returns the number of texts indexed.
    pub async fn load_dialogue_history(&self, path: &Path) -> Result<usize> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let history: HashMap<String, Vec<Message>> = serde_json::from_str(&raw).map_err(|e| {
            Error::new(
                ErrorKind::Decode,
                format!("invalid dialogue history {}: {e}", path.display()),
            )
        })?;

        let mut total = 0;
        for (channel, messages) in history {
            let texts = messages
                .into_iter()
                .filter(|m| m.role == Role::User)
                .map(|m| m.content)
                .collect::<Vec<_>>();
            match self.add_texts(&channel, &texts).await {
                Ok(n) => total += n,
                Err(e) => tracing::error!("failed to index history for channel {channel}: {e}"),
            }
        }
        tracing::info!("indexed {total} historical messages from {}", path.display());
        Ok(total)
    }

    /// Write one artifact per channel at `<base>_<channel_id>`.
    ///
    /// Returns the number of artifacts written.
    pub async fn save(&self, base: &Path) -> Result<usize> {
        if let Some(parent) = base.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let indexes = self
            .indexes
            .read()
            .iter()
            .map(|(channel, index)| (channel.clone(), index.clone()))
            .collect::<Vec<_>>();

        for (channel, index) in &indexes {
            let json = {
                let index = index.lock().await;
                serde_json::to_vec(&*index)
                    .map_err(|e| Error::new(ErrorKind::Decode, e.to_string()))?
            };
            tokio::fs::write(artifact_path(base, channel), json).await?;
        }
        tracing::info!("saved {} channel indexes to {}", indexes.len(), base.display());
        Ok(indexes.len())
    }

    /// Replace all indexes with the artifacts found next to `base`.
    ///
    /// Files in `base`'s directory named `<base name>_<channel_id>` are
    /// loaded; the channel id is the text after the last `_`. A missing
    /// directory loads nothing. Returns the number of channels loaded.
    pub async fn load(&self, base: &Path) -> Result<usize> {
        let dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Some(prefix) = base.file_name().and_then(|n| n.to_str()) else {
            return Err(Error::config(format!(
                "invalid index path {}",
                base.display()
            )));
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut loaded = HashMap::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(channel) = name.to_str().and_then(|name| channel_of(prefix, name)) else {
                continue;
            };

            let raw = tokio::fs::read(entry.path()).await?;
            let index: FlatIndex = serde_json::from_slice(&raw).map_err(|e| {
                Error::new(
                    ErrorKind::Decode,
                    format!("invalid index artifact {}: {e}", entry.path().display()),
                )
            })?;
            tracing::info!("loaded index for channel {channel} ({} entries)", index.len());
            loaded.insert(CompactString::from(channel), Arc::new(Mutex::new(index)));
        }

        let count = loaded.len();
        *self.indexes.write() = loaded;
        Ok(count)
    }
}

/// Format related texts as a 1-based numbered list under `Database:`.
///
/// No trailing newline.
pub fn format_related(related: &[String]) -> String {
    let mut out = String::from("Database:");
    for (i, text) in related.iter().enumerate() {
        out.push_str(&format!("\n{}. <{text}>", i + 1));
    }
    out
}

/// Artifact path for one channel.
pub fn artifact_path(base: &Path, channel: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!("_{channel}"));
    PathBuf::from(name)
}

/// Channel id of an artifact file name, if it belongs to `prefix`.
fn channel_of<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('_')?;
    rest.rsplit('_').next().filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_of_takes_last_segment() {
        assert_eq!(channel_of("vector_store", "vector_store_123"), Some("123"));
        assert_eq!(channel_of("vector_store", "vector_store_x_456"), Some("456"));
        assert_eq!(channel_of("vector_store", "vector_store"), None);
        assert_eq!(channel_of("vector_store", "other_123"), None);
        assert_eq!(channel_of("vector_store", "vector_store_"), None);
    }

    #[test]
    fn artifact_path_appends_channel() {
        let path = artifact_path(Path::new("/data/vector_store"), "42");
        assert_eq!(path, Path::new("/data/vector_store_42"));
    }
}
