use crate::bot::TurnOrchestrator;
use crate::channels::telegram::LONG_POLL_SECS;
use crate::channels::{Channel, TelegramChannel, wait_until_healthy};
use crate::cli::{Cli, Commands};
use crate::config::{Config, KnowledgeConfig, SpeechConfig};
use crate::error::Result;
use crate::knowledge::{KnowledgeAugmenter, WikipediaClient};
use crate::monitor::{CredentialFlags, MonitorState, Snapshot, render_text, run_monitor};
use crate::observability::init_logging;
use crate::persona::Persona;
use crate::providers::{GeminiClient, ModelClient, build_client};
use crate::responder::Responder;
use crate::speech::{GoogleTranslateTts, SpeechSynthesizer};
use crate::storage::ConversationStore;
use anyhow::Context;
use chrono::{Local, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const HEALTH_ATTEMPTS: u32 = 3;
const HEALTH_RETRY_DELAY: Duration = Duration::from_secs(5);
const INBOUND_QUEUE: usize = 64;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run_bot(config).await,
        Commands::Monitor {
            json,
            serve,
            log_file,
            host,
            port,
        } => {
            init_logging(&config.logging, None)?;
            let log_file = log_file.unwrap_or_else(|| config.logging.file.clone());
            if serve {
                let host = host.unwrap_or_else(|| config.monitor.host.clone());
                let port = port.unwrap_or(config.monitor.port);
                serve_monitor(&config, log_file, &host, port).await
            } else {
                print_monitor(&config, &log_file, json).await
            }
        }
        Commands::Rollup { date } => {
            init_logging(&config.logging, None)?;
            run_rollup(&config, date).await
        }
    }
}

fn build_knowledge(config: &KnowledgeConfig) -> anyhow::Result<KnowledgeAugmenter> {
    let client = build_client(config.timeout_secs, Some(&config.user_agent));
    let primary = WikipediaClient::new(&config.primary_base_url, client.clone())
        .with_context(|| format!("invalid primary encyclopedia url {}", config.primary_base_url))?;
    let secondary = WikipediaClient::new(&config.secondary_base_url, client).with_context(|| {
        format!(
            "invalid secondary encyclopedia url {}",
            config.secondary_base_url
        )
    })?;
    Ok(KnowledgeAugmenter::new(Arc::new(primary), Arc::new(secondary)))
}

fn build_speech(config: &SpeechConfig) -> SpeechSynthesizer {
    let client = build_client(config.timeout_secs, None);
    SpeechSynthesizer::new(Arc::new(GoogleTranslateTts::new(
        &config.base_url,
        &config.language,
        config.slow,
        client,
    )))
}

/// Run the bot until Ctrl-C or until the Telegram listener gives up.
async fn run_bot(config: Config) -> Result<()> {
    let credentials = config.credentials()?;
    init_logging(&config.logging, Some(&config.logging.file))?;
    info!("Starting Maveli bot...");

    let store = Arc::new(ConversationStore::connect(&config.storage.database_path).await?);
    let persona = Arc::new(Persona::load(config.bot.persona_file.as_deref())?);

    let model: Arc<dyn ModelClient> = Arc::new(GeminiClient::new(
        &credentials.gemini_api_key,
        &config.model.name,
        &config.model.base_url,
        build_client(config.model.timeout_secs, None),
    ));
    let knowledge = if config.knowledge.enabled {
        Some(build_knowledge(&config.knowledge)?)
    } else {
        info!("Encyclopedia lookups disabled");
        None
    };
    let history_turns = usize::try_from(config.bot.history_turns).unwrap_or(usize::MAX);
    let responder = Responder::new(
        model,
        Arc::clone(&store),
        knowledge,
        Arc::clone(&persona),
        history_turns,
    );
    let speech = if config.speech.enabled {
        Some(build_speech(&config.speech))
    } else {
        info!("Voice replies disabled; answering with text only");
        None
    };

    let channel = Arc::new(TelegramChannel::new(
        credentials.telegram_api_key,
        &config.bot.telegram_base_url,
        build_client(LONG_POLL_SECS + 15, None),
    ));
    let orchestrator = TurnOrchestrator::new(
        Arc::clone(&channel) as Arc<dyn Channel>,
        responder,
        speech,
        Arc::clone(&store),
        persona,
        config.admin_user_id,
        Duration::from_secs(config.bot.turn_timeout_secs),
    );

    wait_until_healthy(channel.as_ref(), HEALTH_ATTEMPTS, HEALTH_RETRY_DELAY).await;

    let (tx, rx) = mpsc::channel(INBOUND_QUEUE);
    let listener = {
        let channel = Arc::clone(&channel);
        tokio::spawn(async move {
            if let Err(e) = channel.listen(tx).await {
                tracing::error!("Telegram listener stopped: {e:#}");
            }
        })
    };
    info!("Maveli bot is running. Press Ctrl-C to stop.");

    tokio::select! {
        () = orchestrator.run(rx) => warn!("Telegram listener ended; shutting down"),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for Ctrl-C: {e}");
            }
            info!("Bot stopped by user");
        }
    }

    listener.abort();
    {
        let stats = orchestrator.stats();
        let stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
        info!(
            "Session totals: {} messages, {} replies ({} voice), {} failures",
            stats.total_messages,
            stats.successful_responses,
            stats.audio_generations,
            stats.failed_responses
        );
    }
    store.close().await;
    Ok(())
}

async fn serve_monitor(config: &Config, log_file: PathBuf, host: &str, port: u16) -> Result<()> {
    let store = match ConversationStore::connect(&config.storage.database_path).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Conversation database unavailable, serving log views only: {e}");
            None
        }
    };

    let state = MonitorState {
        log_file: Arc::new(log_file),
        tail_lines: config.monitor.log_tail_lines,
        store,
        credentials: CredentialFlags::from_config(config),
    };
    Ok(run_monitor(host, port, state).await?)
}

async fn print_monitor(config: &Config, log_file: &std::path::Path, json: bool) -> Result<()> {
    let snapshot = Snapshot::load(log_file, config.monitor.log_tail_lines).await?;
    if json {
        let json = serde_json::to_string_pretty(&snapshot.stats).context("serialize stats")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&snapshot.stats, Local::now().naive_local()));
    }
    Ok(())
}

/// Stored timestamps are UTC, so the default day is today in UTC.
async fn run_rollup(config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let store = ConversationStore::connect(&config.storage.database_path).await?;
    let row = store.record_daily_rollup(date).await;
    store.close().await;

    let stats = row.with_context(|| format!("daily rollup for {date} failed; see the log"))?;
    println!(
        "{date}: {} messages, {} answered, {} voice, {} users",
        stats.total_messages,
        stats.successful_responses,
        stats.audio_generations,
        stats.unique_users
    );
    Ok(())
}
