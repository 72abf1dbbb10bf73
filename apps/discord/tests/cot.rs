//! Tests for step-by-step reasoning.

mod common;

use common::{Event, Recorder, Reply, Scripted};
use futures_util::TryStreamExt;
use model::Dispatcher;
use pcore::{ErrorKind, Message, Role};
use piggy_discord::{
    FINAL_ANSWER_REQUEST, FINAL_TITLE, MAX_STEPS, NextAction, REASONING_PRIMER, Steps, Tier,
    chain_of_thought, cot, extract_json, parse_step,
};

fn step(title: &str, next: &str, tier: &str) -> Reply {
    Reply::text(format!(
        "Sure.\n```json\n{{\"title\": \"{title}\", \"content\": \"thinking about {title}\", \
         \"next_action\": \"{next}\", \"model_selection\": \"{tier}\"}}\n```"
    ))
}

fn dispatcher(gemini: &Scripted, local: &Scripted) -> Dispatcher<Scripted> {
    let dispatcher = Dispatcher::new(vec!["gemini".into(), "local".into()]);
    dispatcher.register("gemini", gemini.clone());
    dispatcher.register("local", local.clone());
    dispatcher
}

async fn reason(gemini: &Scripted, local: &Scripted) -> pcore::Result<Vec<Steps>> {
    chain_of_thought(dispatcher(gemini, local), "why is the sky blue".to_owned())
        .try_collect()
        .await
}

#[test]
fn json_is_extracted_from_fences_or_last_brace() {
    assert_eq!(extract_json("x ```json\n{\"a\":1}\n``` y"), "{\"a\":1}");
    assert_eq!(extract_json("{\"a\":{\"b\":2}} trailing"), "{\"a\":{\"b\":2}}");
    assert_eq!(extract_json("no json here"), "no json here");
}

#[test]
fn step_fields_default() {
    let step = parse_step(r#"{"title": "t", "content": "c"}"#).unwrap();
    assert_eq!(step.next_action, NextAction::Continue);
    assert_eq!(step.model_selection, None);
    assert_eq!(Tier::default(), Tier::Advanced);

    let err = parse_step("not a step").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn tiers_route_between_providers() {
    let gemini = Scripted::new([step("Analyse", "continue", "basic")]);
    let local = Scripted::new([
        step("Conclude", "final_answer", "basic"),
        Reply::text(
            r#"{"title": "Answer", "content": "瑞利散射", "next_action": "final_answer"}"#,
        ),
    ]);

    let snapshots = reason(&gemini, &local).await.unwrap();
    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].final_answer(), None);

    let last = snapshots.last().unwrap();
    let titles = last.steps.iter().map(|s| s.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, ["Step 1: Analyse", "Step 2: Conclude", FINAL_TITLE]);
    assert_eq!(last.final_answer(), Some("瑞利散射"));
    assert!(last.total.is_some());

    let first = &gemini.requests()[0];
    assert!(first.instruction.is_empty());
    assert_eq!(
        first.history,
        [
            Message::user("why is the sky blue"),
            Message::assistant(REASONING_PRIMER),
        ]
    );

    let requests = local.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].instruction, FINAL_ANSWER_REQUEST);
}

#[tokio::test]
async fn model_turns_keep_the_assistant_role() {
    let gemini = Scripted::new([
        step("One", "continue", "advanced"),
        step("Two", "final_answer", "advanced"),
        Reply::text("done"),
    ]);
    reason(&gemini, &Scripted::default()).await.unwrap();

    let roles = |request: &pcore::Request| {
        request
            .messages()
            .iter()
            .map(|m| m.role)
            .collect::<Vec<_>>()
    };
    let requests = gemini.requests();
    assert_eq!(roles(&requests[0]), [Role::System, Role::User, Role::Assistant]);
    assert_eq!(
        roles(&requests[1]),
        [Role::System, Role::User, Role::Assistant, Role::Assistant]
    );
    assert_eq!(
        roles(&requests[2]),
        [
            Role::System,
            Role::User,
            Role::Assistant,
            Role::Assistant,
            Role::Assistant,
            Role::User,
        ]
    );
    assert_eq!(requests[0].messages()[2].content, REASONING_PRIMER);
}

#[tokio::test]
async fn unparsable_final_answer_is_used_verbatim() {
    let gemini = Scripted::new([
        step("Only", "final_answer", "advanced"),
        Reply::text("just plain text"),
    ]);
    let snapshots = reason(&gemini, &Scripted::default()).await.unwrap();
    assert_eq!(
        snapshots.last().unwrap().final_answer(),
        Some("just plain text")
    );
}

#[tokio::test]
async fn steps_are_capped() {
    let replies = (0..MAX_STEPS)
        .map(|i| step(&format!("s{i}"), "continue", "advanced"))
        .chain([Reply::text("done")])
        .collect::<Vec<_>>();
    let gemini = Scripted::new(replies);

    let snapshots = reason(&gemini, &Scripted::default()).await.unwrap();
    let last = snapshots.last().unwrap();
    assert_eq!(last.steps.len(), MAX_STEPS + 1);
    assert_eq!(last.final_answer(), Some("done"));
}

#[tokio::test]
async fn malformed_step_fails_the_stream() {
    let gemini = Scripted::new([Reply::text("I refuse to use JSON")]);
    let err = reason(&gemini, &Scripted::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn command_sends_long_answer_in_parts() {
    let answer = "字".repeat(4000);
    let gemini = Scripted::new([
        step("Only", "final_answer", "advanced"),
        Reply::text(format!(r#"{{"title": "A", "content": "{answer}"}}"#)),
    ]);
    let channel = Recorder::default();

    cot::run(&channel, &1, dispatcher(&gemini, &Scripted::default()), "q".to_owned())
        .await
        .unwrap();

    let sent = channel
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Send(_, text) => Some(text.chars().count()),
            Event::Edit(..) => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(sent, [1900, 1900, 200]);
    assert!(channel.text_of(1).unwrap().contains("**Final Answer**"));
}

#[tokio::test]
async fn command_reports_errors_in_placeholder() {
    let gemini = Scripted::new([Reply::text("garbage")]);
    let channel = Recorder::default();
    cot::run(&channel, &1, dispatcher(&gemini, &Scripted::default()), "q".to_owned())
        .await
        .unwrap();
    assert!(channel.text_of(1).unwrap().starts_with("Error: "));
}
