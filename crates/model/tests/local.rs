//! Tests for the local provider's worker-thread streaming.

use futures_util::StreamExt;
use pcore::{Error, ErrorKind, Generator, Message, Request, Role, join_worker};
use piggy_model::{InferenceSession, Local, Sampling};
use std::sync::{Arc, Mutex};

/// Echoes the last message back word by word.
#[derive(Default)]
struct Echo {
    seen: Mutex<Vec<(Vec<Role>, Sampling)>>,
}

impl InferenceSession for Echo {
    fn generate(
        &self,
        messages: &[Message],
        sampling: &Sampling,
        sink: &mut dyn FnMut(String) -> bool,
    ) -> pcore::Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((messages.iter().map(|m| m.role).collect(), *sampling));
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        for word in last.split_inclusive(' ') {
            if !sink(word.to_owned()) {
                break;
            }
        }
        Ok(())
    }
}

struct Failing;

impl InferenceSession for Failing {
    fn generate(
        &self,
        _messages: &[Message],
        _sampling: &Sampling,
        sink: &mut dyn FnMut(String) -> bool,
    ) -> pcore::Result<()> {
        sink("partial".to_owned());
        Err(Error::generation("out of memory"))
    }
}

#[tokio::test]
async fn unloaded_is_unavailable_config_error() {
    let local = Local::unloaded();
    assert!(!local.is_available());
    let err = local.generate(&Request::new("hi", "sys")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn tokens_stream_from_worker() {
    let session = Arc::new(Echo::default());
    let local = Local::new(session.clone());
    assert!(local.is_available());

    let request = Request::new("one two three", "sys").history(vec![Message::assistant("earlier")]);
    let generation = local.generate(&request).await.unwrap();
    let (worker, fragments) = generation.into_parts();
    assert!(worker.is_some());

    let tokens = fragments.map(|t| t.unwrap()).collect::<Vec<_>>().await;
    assert_eq!(tokens, ["one ", "two ", "three"]);
    join_worker(worker).await;

    let seen = session.seen.lock().unwrap();
    assert_eq!(seen[0].0, [Role::System, Role::Assistant, Role::User]);
    assert_eq!(seen[0].1, Sampling::default());
}

#[tokio::test]
async fn failure_arrives_after_partial_output() {
    let local = Local::new(Arc::new(Failing));
    let (worker, fragments) = local
        .generate(&Request::new("hi", "sys"))
        .await
        .unwrap()
        .into_parts();

    let items = fragments.collect::<Vec<_>>().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "partial");
    assert_eq!(items[1].as_ref().unwrap_err().kind(), ErrorKind::Generation);
    join_worker(worker).await;
}

#[tokio::test]
async fn dropping_the_stream_stops_the_worker() {
    let local = Local::new(Arc::new(Echo::default()));
    let long = "word ".repeat(1000);
    let (worker, mut fragments) = local
        .generate(&Request::new(long, "sys"))
        .await
        .unwrap()
        .into_parts();

    assert_eq!(fragments.next().await.unwrap().unwrap(), "word ");
    drop(fragments);
    join_worker(worker).await;
}

#[test]
fn sampling_defaults() {
    let sampling = Sampling::default();
    assert_eq!(sampling.max_new_tokens, 8192);
    assert_eq!(sampling.temperature, 0.6);
    assert_eq!(sampling.top_p, 0.9);
    assert!(sampling.do_sample);
}
