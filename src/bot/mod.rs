//! The turn pipeline: one inbound message in, one reply out, one row stored.

mod stats;

pub use stats::{BotStats, RECENT_CAPACITY, RecentMessage};

use crate::channels::{Channel, ChatAction, InboundMessage};
use crate::commands::{Command, parse_command};
use crate::persona::Persona;
use crate::responder::Responder;
use crate::speech::SpeechSynthesizer;
use crate::storage::ConversationStore;
use crate::utils::{truncate_chars, truncate_utf16};
use chrono::Local;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use strum::Display;
use tokio::sync::mpsc;

/// Progress of a single turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TurnState {
    Received,
    UserRecorded,
    ResponseGenerated,
    AudioAttempted,
    Delivered,
    Persisted,
}

/// How a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A reply reached the user; `voice` when it went out as audio.
    Delivered { voice: bool },
    /// A command was answered.
    Command(Command),
    /// No reply could be delivered; an apology was attempted.
    Failed,
}

pub struct TurnOrchestrator {
    channel: Arc<dyn Channel>,
    responder: Responder,
    speech: Option<SpeechSynthesizer>,
    store: Arc<ConversationStore>,
    persona: Arc<Persona>,
    stats: Arc<Mutex<BotStats>>,
    admin_user_id: Option<i64>,
    turn_timeout: Duration,
}

impl TurnOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel: Arc<dyn Channel>,
        responder: Responder,
        speech: Option<SpeechSynthesizer>,
        store: Arc<ConversationStore>,
        persona: Arc<Persona>,
        admin_user_id: Option<i64>,
        turn_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            responder,
            speech,
            store,
            persona,
            stats: Arc::new(Mutex::new(BotStats::new(Local::now()))),
            admin_user_id,
            turn_timeout,
        }
    }

    /// Shared handle to the runtime counters.
    pub fn stats(&self) -> Arc<Mutex<BotStats>> {
        Arc::clone(&self.stats)
    }

    fn with_stats<R>(&self, f: impl FnOnce(&mut BotStats) -> R) -> R {
        let mut guard = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Handle messages one at a time until the sender side closes.
    pub async fn run(&self, mut rx: mpsc::Receiver<InboundMessage>) {
        while let Some(msg) = rx.recv().await {
            self.handle(&msg).await;
        }
        tracing::info!("Inbound channel closed; turn loop stopped");
    }

    pub async fn handle(&self, msg: &InboundMessage) -> TurnOutcome {
        match parse_command(&msg.text) {
            Some(command) => {
                self.handle_command(command, msg).await;
                TurnOutcome::Command(command)
            }
            None => self.handle_turn(msg).await,
        }
    }

    async fn handle_command(&self, command: Command, msg: &InboundMessage) {
        let user_id = msg.sender.id;
        self.with_stats(|s| s.record_message(Local::now()));
        let reply = match command {
            Command::Start | Command::Help => self.persona.welcome.clone(),
            Command::Stats if self.admin_user_id == Some(user_id) => {
                let stored = self.store.get_aggregate_user_stats().await;
                self.with_stats(|s| s.report(Local::now(), Some(&stored)))
            }
            Command::Stats => {
                tracing::warn!("Refused /{command} for non-admin user {user_id}");
                self.persona.admin_only.clone()
            }
        };

        match self
            .channel
            .reply_text(msg.chat_id, Some(msg.message_id), &reply)
            .await
        {
            Ok(()) if matches!(command, Command::Start | Command::Help) => {
                tracing::info!("Welcome message sent to user {user_id}");
            }
            Ok(()) => {}
            Err(e) => tracing::error!("Failed to answer /{command} for user {user_id}: {e:#}"),
        }
    }

    fn advance(&self, user_id: i64, state: TurnState) {
        tracing::debug!("Turn for user {user_id}: {state}");
    }

    async fn handle_turn(&self, msg: &InboundMessage) -> TurnOutcome {
        let started = Instant::now();
        let sender = &msg.sender;
        let user_id = sender.id;
        let user_name = sender.display_name();

        let now = Local::now();
        self.with_stats(|s| {
            s.record_message(now);
            s.push_recent(RecentMessage::new(
                now,
                user_id,
                user_name,
                sender.username.as_deref(),
                &msg.text,
            ));
        });
        tracing::info!(
            "Received message from user {user_id} ({user_name}): {}...",
            truncate_chars(&msg.text, 100)
        );
        self.advance(user_id, TurnState::Received);

        if !self
            .store
            .upsert_user(
                user_id,
                sender.username.as_deref(),
                sender.first_name.as_deref(),
                sender.last_name.as_deref(),
            )
            .await
        {
            tracing::warn!("Database user update failed for user {user_id}");
        }
        self.advance(user_id, TurnState::UserRecorded);

        self.best_effort_action(msg.chat_id, ChatAction::Typing).await;
        let Ok(reply) =
            tokio::time::timeout(self.turn_timeout, self.responder.generate(&msg.text, user_id))
                .await
        else {
            tracing::error!(
                "Error handling message from user {user_id}: no reply within {}s",
                self.turn_timeout.as_secs()
            );
            self.fail(msg).await;
            return TurnOutcome::Failed;
        };
        let latency_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.advance(user_id, TurnState::ResponseGenerated);

        let audio = match &self.speech {
            Some(speech) => {
                self.best_effort_action(msg.chat_id, ChatAction::UploadVoice)
                    .await;
                speech.synthesize(&reply).await
            }
            None => None,
        };
        self.advance(user_id, TurnState::AudioAttempted);

        let voice = match audio {
            Some(artifact) => {
                let caption = truncate_utf16(&reply, self.channel.max_caption_length());
                let sent = self
                    .channel
                    .reply_voice(msg.chat_id, Some(msg.message_id), artifact.path(), caption)
                    .await;
                artifact.cleanup();
                match sent {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            "Voice delivery failed for user {user_id}, falling back to text: {e:#}"
                        );
                        false
                    }
                }
            }
            None => false,
        };

        if !voice
            && let Err(e) = self
                .channel
                .reply_text(msg.chat_id, Some(msg.message_id), &reply)
                .await
        {
            tracing::error!("Error handling message from user {user_id}: {e:#}");
            self.fail(msg).await;
            return TurnOutcome::Failed;
        }
        self.advance(user_id, TurnState::Delivered);

        self.with_stats(|s| {
            s.record_success(voice);
            s.mark_last_answered(&reply);
        });
        if voice {
            tracing::info!("Successfully sent audio response to user {user_id} ({user_name})");
        } else if self.speech.is_some() {
            tracing::warn!(
                "Audio generation failed, sent text response to user {user_id} ({user_name})"
            );
        } else {
            tracing::info!("Sent text response to user {user_id} ({user_name})");
        }

        let language = detect_language(&msg.text);
        if !self
            .store
            .save_turn(user_id, &msg.text, &reply, Some(latency_ms), voice, language)
            .await
        {
            tracing::warn!("Database conversation save failed for user {user_id}");
        }
        self.advance(user_id, TurnState::Persisted);

        TurnOutcome::Delivered { voice }
    }

    async fn best_effort_action(&self, chat_id: i64, action: ChatAction) {
        if let Err(e) = self.channel.send_chat_action(chat_id, action).await {
            tracing::debug!("Chat action {action} failed: {e:#}");
        }
    }

    async fn fail(&self, msg: &InboundMessage) {
        self.with_stats(BotStats::record_failure);
        if let Err(e) = self
            .channel
            .reply_text(msg.chat_id, Some(msg.message_id), &self.persona.apology)
            .await
        {
            tracing::error!("Failed to send error message: {e:#}");
        }
    }
}

/// ISO 639-3 code of `text` when detection is confident.
pub fn detect_language(text: &str) -> Option<&'static str> {
    whatlang::detect(text)
        .filter(whatlang::Info::is_reliable)
        .map(|info| info.lang().code())
}
