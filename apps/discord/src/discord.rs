//! Serenity adapter and event handler.

use crate::{
    config::Config,
    convert::TaiwanTraditional,
    cot,
    reply::Responder,
    utils::strip_mention,
};
use anyhow::Context as _;
use compact_str::{CompactString, format_compact};
use memory::{ChannelMemory, HttpEmbedder};
use model::{Credentials, Dispatcher, InferenceSession};
use pcore::{Attachment, ChatChannel, ChatMessage};
use serenity::{
    Client,
    all::{
        ChannelId, Context, EditMessage, EventHandler, GatewayIntents, GetMessages, Http, Message,
        MessageId, Ready, UserId,
    },
    async_trait,
};
use std::sync::Arc;
use vision::{OpenAIVision, Vqa};

/// Placeholder posted while a reply is being prepared.
pub const THINKING: &str = "Thinking...";

/// Prefix that routes a mention to step-by-step reasoning.
pub const REASONING_COMMAND: &str = "!cot";

/// One Discord text channel.
#[derive(Clone)]
pub struct DiscordChannel {
    http: Arc<Http>,
    channel: ChannelId,
    bot: UserId,
    client: reqwest::Client,
}

impl DiscordChannel {
    /// Wrap `channel`, recognising messages authored by `bot`.
    pub fn new(http: Arc<Http>, channel: ChannelId, bot: UserId, client: reqwest::Client) -> Self {
        Self {
            http,
            channel,
            bot,
            client,
        }
    }
}

impl ChatChannel for DiscordChannel {
    type Handle = MessageId;

    fn id(&self) -> CompactString {
        format_compact!("{}", self.channel.get())
    }

    async fn history(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        let limit = limit.clamp(1, 100) as u8;
        let messages = self
            .channel
            .messages(&self.http, GetMessages::new().limit(limit))
            .await?;
        Ok(messages
            .into_iter()
            .map(|message| ChatMessage {
                author: format_compact!("{}", message.author.id.get()),
                from_bot: message.author.id == self.bot,
                attachments: attachments(&message),
                content: message.content,
            })
            .collect())
    }

    async fn send(&self, content: &str) -> anyhow::Result<MessageId> {
        Ok(self.channel.say(&self.http, content).await?.id)
    }

    async fn edit(&self, message: &MessageId, content: &str) -> anyhow::Result<()> {
        self.channel
            .edit_message(&self.http, *message, EditMessage::new().content(content))
            .await?;
        Ok(())
    }

    async fn download(&self, attachment: &Attachment) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(&attachment.url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn attachments(message: &Message) -> Vec<Attachment> {
    message
        .attachments
        .iter()
        .map(|a| Attachment::new(&a.filename, &a.url))
        .collect()
}

/// Replies to messages that mention the bot.
pub struct Bot {
    responder: Responder<HttpEmbedder, TaiwanTraditional>,
    vqa: Vqa<OpenAIVision>,
    client: reqwest::Client,
}

impl Bot {
    /// Assemble a bot from its parts.
    pub fn new(
        responder: Responder<HttpEmbedder, TaiwanTraditional>,
        vqa: Vqa<OpenAIVision>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            responder,
            vqa,
            client,
        }
    }

    async fn reply(
        &self,
        channel: &DiscordChannel,
        message: &Message,
        me: UserId,
    ) -> anyhow::Result<()> {
        let prompt = strip_mention(&message.content, &me.get().to_string());
        let placeholder = channel.send(THINKING).await?;

        if let Some(question) = prompt.strip_prefix(REASONING_COMMAND) {
            let dispatcher = self.responder.dispatcher().clone();
            return cot::run(channel, &placeholder, dispatcher, question.trim().to_owned()).await;
        }

        let attachments = attachments(message);
        let prompt = if attachments.is_empty() {
            prompt
        } else {
            let seen = self
                .vqa
                .answer(channel, &placeholder, &attachments, &prompt)
                .await;
            format!("{seen}\n{prompt}")
        };
        self.responder
            .gpt_message(channel, &placeholder, &prompt)
            .await;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!("connected to discord as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }
        let me = ctx.cache.current_user().id;
        if !message.mentions_user_id(me) {
            return;
        }

        let channel = DiscordChannel::new(
            ctx.http.clone(),
            message.channel_id,
            me,
            self.client.clone(),
        );
        if let Err(e) = self.reply(&channel, &message, me).await {
            tracing::error!("failed to reply in {}: {e:#}", channel.id());
        }
    }
}

/// Connect to Discord and serve until interrupted, then persist memory.
///
/// API keys come from the environment; `session` enables the local model.
pub async fn run(config: Config, session: Option<Arc<dyn InferenceSession>>) -> anyhow::Result<()> {
    let token = config
        .discord
        .token()
        .context("no discord token configured")?;
    let client = reqwest::Client::new();
    let credentials = Credentials::from_env();

    let dispatcher =
        Dispatcher::from_config(&config.models(), &credentials, session, client.clone())?;
    let key = config
        .embedding
        .api_key
        .as_deref()
        .or(credentials.openai.as_deref());
    let endpoint = config.embedding.endpoint.as_deref().unwrap_or(memory::ENDPOINT);
    let embedder = HttpEmbedder::custom(client.clone(), key, endpoint, &config.embedding.model)?;
    let memory = Arc::new(ChannelMemory::new(embedder));
    config.data.restore(&memory).await;

    let vision = OpenAIVision::new(
        client.clone(),
        config.vision.api_key.as_deref(),
        &config.vision.endpoint,
        &config.vision.model,
    )?;
    let responder = Responder::new(dispatcher, memory.clone(), TaiwanTraditional);
    let bot = Bot::new(responder, Vqa::new(vision), client);

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut discord = Client::builder(&token, intents)
        .event_handler(bot)
        .await
        .context("failed to build discord client")?;

    let shards = discord.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
            shards.shutdown_all().await;
        }
    });

    discord.start().await?;
    let saved = memory.save(&config.data.vector_store).await?;
    tracing::info!("saved {saved} channel indexes");
    Ok(())
}
