//! Tests for ChannelMemory.

use pcore::{Embedder, Error, ErrorKind, Result};
use piggy_memory::{ChannelMemory, NEIGHBOURS, artifact_path, format_related};
use std::sync::Arc;

/// Letter-frequency embedder: texts sharing letters land close together.
struct Letters;

impl Embedder for Letters {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("boom") {
            return Err(Error::new(ErrorKind::Embedding, "embedder exploded"));
        }
        let mut vector = vec![0.0; 27];
        for c in text.to_lowercase().chars() {
            match c {
                'a'..='z' => vector[(c as u8 - b'a') as usize] += 1.0,
                _ => vector[26] += 1.0,
            }
        }
        Ok(vector)
    }
}

fn memory() -> ChannelMemory<Letters> {
    ChannelMemory::new(Letters)
}

// --- search ---

#[tokio::test]
async fn unknown_channel_is_empty_not_error() {
    let mem = memory();
    assert_eq!(mem.search("nowhere", "hello").await, "");
    assert!(mem.related("nowhere", "hello").await.unwrap().is_empty());
}

#[tokio::test]
async fn observed_messages_are_found() {
    let mem = memory();
    mem.observe("c1", "cats purr").await.unwrap();
    mem.observe("c1", "dogs bark").await.unwrap();
    mem.observe("c2", "elsewhere").await.unwrap();

    let related = mem.related("c1", "cats purr loudly").await.unwrap();
    assert_eq!(related, ["cats purr", "dogs bark"]);

    let formatted = mem.search("c1", "cats purr loudly").await;
    assert_eq!(formatted, "Database:\n1. <cats purr>\n2. <dogs bark>");
}

#[tokio::test]
async fn duplicates_collapse_keeping_rank() {
    let mem = memory();
    for text in ["hello", "zzz", "hello", "hello there"] {
        mem.observe("c", text).await.unwrap();
    }

    let related = mem.related("c", "hello").await.unwrap();
    assert_eq!(related, ["hello", "hello there", "zzz"]);
}

#[tokio::test]
async fn results_are_capped() {
    let mem = memory();
    let texts = (0..30).map(|i| "x".repeat(i + 1)).collect::<Vec<_>>();
    assert_eq!(mem.add_texts("c", &texts).await.unwrap(), 30);

    let related = mem.related("c", "x").await.unwrap();
    assert_eq!(related.len(), NEIGHBOURS);
    assert_eq!(related[0], "x");
}

#[tokio::test]
async fn embedding_failure_degrades_to_empty() {
    let mem = memory();
    mem.observe("c", "fine").await.unwrap();
    assert_eq!(mem.search("c", "boom").await, "");
    assert!(mem.observe("c", "boom").await.is_err());
    assert_eq!(mem.len("c").await, 1);
}

/// Embeds to a vector as long as the text.
struct Width;

impl Embedder for Width {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; text.len()])
    }
}

#[tokio::test]
async fn mismatched_batch_is_not_indexed() {
    let mem = ChannelMemory::new(Width);
    let texts = ["ab", "cd", "xyz"].map(String::from);
    let err = mem.add_texts("c", &texts).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Embedding);
    assert_eq!(mem.len("c").await, 0);
    assert!(mem.related("c", "zz").await.unwrap().is_empty());

    mem.add_texts("c", &texts[..2]).await.unwrap();
    assert_eq!(mem.related("c", "zz").await.unwrap(), ["ab", "cd"]);
}

#[tokio::test]
async fn blank_observations_are_ignored() {
    let mem = memory();
    mem.observe("c", "   ").await.unwrap();
    assert!(mem.channels().is_empty());
}

#[tokio::test]
async fn concurrent_observes_on_one_channel() {
    let mem = Arc::new(memory());
    let tasks = (0..16)
        .map(|i| {
            let mem = mem.clone();
            tokio::spawn(async move { mem.observe("busy", &format!("message {i}")).await })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(mem.len("busy").await, 16);
}

#[test]
fn format_numbers_from_one() {
    let related = vec!["a".to_owned(), "b".to_owned()];
    assert_eq!(format_related(&related), "Database:\n1. <a>\n2. <b>");
    assert_eq!(format_related(&[]), "Database:");
}

// --- dialogue history ---

#[tokio::test]
async fn history_indexes_user_turns_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dialogue_history.json");
    std::fs::write(
        &path,
        r#"{
            "100": [
                {"role": "user", "content": "first question"},
                {"role": "assistant", "content": "an answer"},
                {"role": "user", "content": "second question"}
            ],
            "200": [{"role": "assistant", "content": "only me"}]
        }"#,
    )
    .unwrap();

    let mem = memory();
    assert_eq!(mem.load_dialogue_history(&path).await.unwrap(), 2);
    assert_eq!(mem.len("100").await, 2);
    assert_eq!(mem.len("200").await, 0);
}

#[tokio::test]
async fn missing_history_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mem = memory();
    let loaded = mem
        .load_dialogue_history(&dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(loaded, 0);
}

#[tokio::test]
async fn malformed_history_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "not json").unwrap();
    let err = memory().load_dialogue_history(&path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

// --- persistence ---

#[tokio::test]
async fn save_writes_one_artifact_per_channel_and_load_restores() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("store").join("vector_store");

    let mem = memory();
    mem.observe("111", "alpha").await.unwrap();
    mem.observe("111", "beta").await.unwrap();
    mem.observe("222", "gamma").await.unwrap();
    assert_eq!(mem.save(&base).await.unwrap(), 2);
    assert!(artifact_path(&base, "111").exists());
    assert!(artifact_path(&base, "222").exists());

    let restored = memory();
    restored.observe("stale", "dropped on load").await.unwrap();
    assert_eq!(restored.load(&base).await.unwrap(), 2);
    assert_eq!(restored.channels(), ["111", "222"]);
    assert_eq!(restored.len("111").await, 2);
    assert_eq!(
        restored.search("222", "gamma").await,
        "Database:\n1. <gamma>"
    );
}

#[tokio::test]
async fn load_from_missing_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mem = memory();
    let loaded = mem.load(&dir.path().join("nope").join("vector_store")).await.unwrap();
    assert_eq!(loaded, 0);
}
