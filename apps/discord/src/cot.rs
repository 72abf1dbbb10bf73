//! Step-by-step reasoning over two model tiers.
//!
//! The model answers with one JSON step at a time. Each step names the tier
//! for the next one: `basic` runs on the local model, `advanced` on Gemini.
//! Reasoning stops on `final_answer` or after [`MAX_STEPS`], then one more
//! turn asks for the conclusion.

use crate::{
    prompt::{FINAL_ANSWER_REQUEST, REASONING_PRIMER, REASONING_PROMPT},
    relay::{MESSAGE_CEILING, strip_marker},
    utils::split_message,
};
use futures_core::Stream;
use futures_util::{StreamExt, TryStreamExt};
use model::{Dispatcher, ProviderKind};
use pcore::{
    ChatChannel, Error, ErrorKind, Generator, Message, Request, Result, Role, join_worker,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Upper bound on reasoning steps before the answer is forced.
pub const MAX_STEPS: usize = 25;

/// Title of the concluding step.
pub const FINAL_TITLE: &str = "Final Answer";

/// Model tier a step asks for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The local model.
    Basic,
    /// Gemini.
    #[default]
    Advanced,
}

impl Tier {
    /// The provider serving this tier.
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Basic => ProviderKind::Local,
            Self::Advanced => ProviderKind::Gemini,
        }
    }
}

/// Whether reasoning continues after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Another step follows.
    #[default]
    Continue,
    /// Reasoning is done.
    FinalAnswer,
}

/// One reasoning step as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Short title of the reasoning phase.
    pub title: String,
    /// The reasoning itself.
    pub content: String,
    /// Whether to keep going.
    #[serde(default)]
    pub next_action: NextAction,
    /// Tier for the next step; keeps the current one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_selection: Option<Tier>,
}

/// A finished step with its wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed {
    /// Display title, e.g. `Step 2: Checking assumptions`.
    pub title: String,
    /// Step content, or the final answer text.
    pub content: String,
    /// Time the model took.
    pub elapsed: Duration,
}

/// Progress snapshot: all steps so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Steps {
    /// Completed steps in order.
    pub steps: Vec<Timed>,
    /// Total thinking time, set once the final answer is in.
    pub total: Option<Duration>,
}

impl Steps {
    /// The final answer, once reasoning is complete.
    pub fn final_answer(&self) -> Option<&str> {
        self.total?;
        self.steps.last().map(|step| step.content.as_str())
    }

    /// Step titles with timings, one per line.
    pub fn render(&self) -> String {
        self.steps
            .iter()
            .map(|step| {
                format!(
                    "**{}** (thinking time: {:.2}s)\n",
                    step.title,
                    step.elapsed.as_secs_f64()
                )
            })
            .collect()
    }
}

/// The JSON payload of a model response: a fenced `json` block if present,
/// otherwise everything up to the last `}`.
pub fn extract_json(response: &str) -> &str {
    if let Some(start) = response.find("```json") {
        let body = &response[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    match response.rfind('}') {
        Some(end) => &response[..=end],
        None => response,
    }
}

/// Parse a reasoning step out of a raw model response.
pub fn parse_step(response: &str) -> Result<Step> {
    serde_json::from_str(extract_json(response))
        .map_err(|e| Error::new(ErrorKind::Decode, format!("invalid reasoning step: {e}")))
}

/// Reason about `prompt`, yielding a snapshot after every step.
///
/// The last snapshot carries the final answer and the total time.
pub fn chain_of_thought<G>(
    dispatcher: Dispatcher<G>,
    prompt: String,
) -> impl Stream<Item = Result<Steps>> + Send
where
    G: Generator + Clone + 'static,
{
    async_stream::try_stream! {
        let mut messages = vec![
            Message::system(REASONING_PROMPT),
            Message::user(prompt),
            Message::assistant(REASONING_PRIMER),
        ];
        let mut snapshot = Steps::default();
        let mut tier = Tier::default();
        let mut total = Duration::ZERO;

        for number in 1..=MAX_STEPS {
            let started = Instant::now();
            let response = complete(&dispatcher, tier, &messages).await?;
            let step = parse_step(&response)?;
            let elapsed = started.elapsed();
            total += elapsed;
            tracing::debug!("reasoning step {number} on {tier:?}: {}", step.title);

            snapshot.steps.push(Timed {
                title: format!("Step {number}: {}", step.title),
                content: step.content.clone(),
                elapsed,
            });
            let record = serde_json::to_string(&step)
                .map_err(|e| Error::new(ErrorKind::Decode, e.to_string()))?;
            messages.push(Message::assistant(record));
            tier = step.model_selection.unwrap_or(tier);

            let done = step.next_action == NextAction::FinalAnswer;
            yield snapshot.clone();
            if done {
                break;
            }
        }

        messages.push(Message::user(FINAL_ANSWER_REQUEST));
        let started = Instant::now();
        let response = complete(&dispatcher, tier, &messages).await?;
        let answer = match parse_step(&response) {
            Ok(step) => step.content,
            Err(_) => extract_json(&response).to_owned(),
        };
        let elapsed = started.elapsed();
        snapshot.steps.push(Timed {
            title: FINAL_TITLE.to_owned(),
            content: answer,
            elapsed,
        });
        snapshot.total = Some(total + elapsed);
        yield snapshot;
    }
}

/// Run one turn on the tier's provider and collect the whole response.
async fn complete<G: Generator + Clone>(
    dispatcher: &Dispatcher<G>,
    tier: Tier,
    messages: &[Message],
) -> Result<String> {
    let request = turn(messages);
    let generation = dispatcher
        .generate_with(tier.provider().as_str(), &request)
        .await?;
    let (worker, fragments) = generation.into_parts();
    let text = fragments.try_collect::<Vec<_>>().await.map(|parts| parts.concat());
    join_worker(worker).await;
    Ok(strip_marker(&text?))
}

/// Build a request from a conversation whose first message is the system
/// prompt.
///
/// A trailing user message becomes the instruction. Any other trailing
/// turn stays in the history so it keeps its role.
fn turn(messages: &[Message]) -> Request {
    let (system, rest) = match messages.split_first() {
        Some((first, rest)) if first.role == Role::System => (first.content.as_str(), rest),
        _ => ("", messages),
    };
    match rest.split_last() {
        Some((last, history)) if last.role == Role::User => {
            Request::new(&last.content, system).history(history.to_vec())
        }
        _ => Request::new("", system).history(rest.to_vec()),
    }
}

/// Drive reasoning for a chat command: step titles go into `placeholder`,
/// the final answer is sent in parts of at most [`MESSAGE_CEILING`].
pub async fn run<C, G>(
    channel: &C,
    placeholder: &C::Handle,
    dispatcher: Dispatcher<G>,
    prompt: String,
) -> anyhow::Result<()>
where
    C: ChatChannel,
    G: Generator + Clone + 'static,
{
    let mut steps = Box::pin(chain_of_thought(dispatcher, prompt));
    while let Some(snapshot) = steps.next().await {
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("reasoning failed: {e}");
                channel.edit(placeholder, &format!("Error: {e}")).await?;
                return Ok(());
            }
        };

        if let Some(answer) = snapshot.final_answer() {
            for part in split_message(answer, MESSAGE_CEILING) {
                channel.send(&part).await?;
            }
        }
        let titles = snapshot.render();
        if let Some(last) = split_message(&titles, MESSAGE_CEILING).pop() {
            channel.edit(placeholder, &last).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_splits_into_request() {
        let messages = [
            Message::system("sys"),
            Message::user("question"),
            Message::assistant("primer"),
        ];
        let request = turn(&messages);
        assert_eq!(request.system_prompt, "sys");
        assert!(request.instruction.is_empty());
        assert_eq!(
            request.history,
            [Message::user("question"), Message::assistant("primer")]
        );
    }

    #[test]
    fn trailing_user_message_is_the_instruction() {
        let messages = [Message::system("sys"), Message::user("question")];
        let request = turn(&messages);
        assert_eq!(request.instruction, "question");
        assert!(request.history.is_empty());
    }
}
