mod commands;
mod focus;
mod gateway;
mod init;
mod intents;

use clap::{Parser, Subcommand};
use iva_channels::console::{ConsoleChannel, CHANNEL_NAME, LOCAL_SENDER};
use iva_core::{
    config::{self, Config, InputMode, Prompts},
    context::Context,
    shellexpand,
    traits::{Channel, Provider},
};
use iva_google::{CalendarClient, GoogleAuth, TasksClient, CALENDAR_SCOPE, TASKS_SCOPE};
use iva_memory::Store;
use iva_providers::OpenAiProvider;
use iva_voice::{build_speaker, Listener, WhisperClient};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "iva",
    version,
    about = "IVA: reminders, tasks, and a friendly voice for ADHD brains"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation (default).
    Chat,
    /// Send a one-shot message to the chat provider.
    Ask {
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show configuration and provider health.
    Status,
    /// List upcoming reminders.
    Reminders {
        /// "day" or "week".
        #[arg(default_value = "day")]
        period: String,
    },
    /// Mark a reminder as done.
    Done {
        /// Reminder or calendar event id (a prefix is enough).
        id: String,
    },
    /// List open tasks.
    Tasks,
    /// List the ElevenLabs voices available to your account.
    Voices,
    /// Interactive setup wizard.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(cfg).await?,
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: iva ask <message>");
            }
            let provider = build_provider(&cfg)?;
            let prompts = Prompts::load(&cfg.iva.data_dir);
            let context = Context::with_window(
                &prompts.system,
                &[],
                &message.join(" "),
                cfg.memory.max_context_messages,
            );
            let response = provider.complete(&context).await?;
            println!("{}", response.text);
        }
        Commands::Status => print_status(&cli.config, &cfg).await?,
        Commands::Reminders { period } => {
            println!("{}", run_command(&cfg, &format!("/reminders {period}")).await?);
        }
        Commands::Done { id } => {
            println!("{}", run_command(&cfg, &format!("/done {id}")).await?);
        }
        Commands::Tasks => println!("{}", run_command(&cfg, "/tasks").await?),
        Commands::Voices => {
            if cfg.voice.elevenlabs_api_key.is_empty() {
                anyhow::bail!(
                    "no ElevenLabs API key. Set voice.elevenlabs_api_key or ELEVENLABS_API_KEY."
                );
            }
            let voices =
                iva_voice::list_voices(&reqwest::Client::new(), None, &cfg.voice.elevenlabs_api_key)
                    .await?;
            for (name, id) in voices {
                println!("{name:<24} {id}");
            }
        }
        Commands::Init => init::run(&cli.config).await?,
    }

    Ok(())
}

/// Daily rolling log file under `<data_dir>/logs`. `RUST_LOG` wins over the config level.
fn init_logging(cfg: &Config) -> anyhow::Result<WorkerGuard> {
    let dir = cfg.iva.logs_dir();
    std::fs::create_dir_all(&dir)?;
    let appender = tracing_appender::rolling::daily(&dir, "iva.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.iva.log_level)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Build the configured provider.
fn build_provider(cfg: &Config) -> anyhow::Result<Arc<dyn Provider>> {
    match cfg.provider.default.as_str() {
        "openai" => {
            let openai = cfg.provider.openai.clone().unwrap_or_default();
            Ok(Arc::new(OpenAiProvider::from_config(openai)))
        }
        other => anyhow::bail!("unsupported provider: {other}"),
    }
}

/// Calendar and Tasks clients, each with its own token cache.
fn build_google(cfg: &Config) -> (Option<CalendarClient>, Option<TasksClient>) {
    if !cfg.google.enabled {
        return (None, None);
    }
    let g = &cfg.google;
    let calendar_auth = GoogleAuth::new(
        shellexpand(&g.credentials_path),
        shellexpand(&g.token_path),
        &[CALENDAR_SCOPE],
    );
    let tasks_auth = GoogleAuth::new(
        shellexpand(&g.tasks_credentials_path),
        shellexpand(&g.tasks_token_path),
        &[TASKS_SCOPE],
    );
    (
        Some(CalendarClient::new(g, Arc::new(calendar_auth))),
        Some(TasksClient::new(g, Arc::new(tasks_auth))),
    )
}

fn build_console(cfg: &Config) -> anyhow::Result<ConsoleChannel> {
    let speaker = build_speaker(&cfg.voice);
    let channel = match cfg.voice.input_mode {
        InputMode::Text => ConsoleChannel::text(&cfg.iva.name),
        InputMode::Speech => {
            let key = if cfg.voice.whisper_api_key.is_empty() {
                cfg.provider
                    .openai
                    .as_ref()
                    .map(|o| o.api_key.clone())
                    .unwrap_or_default()
            } else {
                cfg.voice.whisper_api_key.clone()
            };
            if key.is_empty() {
                anyhow::bail!("speech input needs an OpenAI key for Whisper transcription");
            }
            let audio_path = Path::new(&shellexpand(&cfg.iva.data_dir)).join("input.wav");
            let listener = Listener::new(&cfg.voice, Arc::new(WhisperClient::new(&key)), audio_path);
            ConsoleChannel::speech(&cfg.iva.name, Arc::new(listener))
        }
    };
    Ok(channel.with_speaker(speaker))
}

async fn run_chat(cfg: Config) -> anyhow::Result<()> {
    let provider = build_provider(&cfg)?;
    if !provider.is_available().await {
        eprintln!(
            "Warning: provider '{}' is not reachable. Reminders and tasks still work.",
            provider.name()
        );
    }

    std::fs::create_dir_all(shellexpand(&cfg.iva.data_dir))?;
    let memory = Store::new(&cfg.memory).await?;
    let prompts = Prompts::load(&cfg.iva.data_dir);
    let (calendar, tasks) = build_google(&cfg);

    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    channels.insert(CHANNEL_NAME.to_string(), Arc::new(build_console(&cfg)?));

    let gw = gateway::Gateway::new(provider, channels, memory, prompts, &cfg)
        .with_google(calendar, tasks);
    Arc::new(gw).run().await
}

/// Run one slash command outside a chat session.
async fn run_command(cfg: &Config, text: &str) -> anyhow::Result<String> {
    let memory = Store::new(&cfg.memory).await?;
    let (calendar, tasks) = build_google(cfg);
    let (focus, _notices) = focus::FocusTimer::new(&cfg.focus);
    let uptime = Instant::now();
    let voice = cfg.voice.tts_engine.display_name();
    let ctx = commands::CommandContext {
        store: &memory,
        channel: CHANNEL_NAME,
        sender_id: LOCAL_SENDER,
        text,
        uptime: &uptime,
        provider_name: &cfg.provider.default,
        voice,
        calendar: calendar.as_ref(),
        tasks: tasks.as_ref(),
        focus: &focus,
    };
    let cmd = commands::Command::parse(text)
        .ok_or_else(|| anyhow::anyhow!("unknown command: {text}"))?;
    Ok(commands::handle(cmd, &ctx).await)
}

async fn print_status(config_path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("IVA Status\n");
    println!("Config: {config_path}");
    println!("Data dir: {}", shellexpand(&cfg.iva.data_dir));
    println!("Default provider: {}", cfg.provider.default);

    let provider = build_provider(cfg)?;
    println!(
        "  {}: {}",
        provider.name(),
        if provider.is_available().await {
            "available"
        } else {
            "not available"
        }
    );
    println!(
        "  google: {}",
        if !cfg.google.enabled {
            "disabled"
        } else if Path::new(&shellexpand(&cfg.google.credentials_path)).exists() {
            "configured"
        } else {
            "enabled but credentials file missing"
        }
    );
    println!(
        "  voice: {:?} in, {} out",
        cfg.voice.input_mode,
        cfg.voice.tts_engine.display_name()
    );
    Ok(())
}
