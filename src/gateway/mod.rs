//! Gateway: the main event loop connecting channels, memory, intent handlers
//! and the chat provider.
//!
//! Every incoming message is processed on its own task. Messages from a sender
//! that already has one in flight are buffered and drained in arrival order,
//! so turns are always appended to history one at a time.

mod confirmation;
mod pipeline;


pub use confirmation::PendingAction;

use crate::focus::FocusTimer;
use crate::intents::Outlets;
use iva_core::{
    config::{Config, InputMode, IvaConfig, Prompts},
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, Provider},
};
use iva_google::{CalendarClient, TasksClient};
use iva_memory::{audit::AuditLogger, Store};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// How long in-flight messages get to finish once the loop stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The central gateway that routes messages between channels and handlers.
pub struct Gateway {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) memory: Store,
    pub(super) audit: AuditLogger,
    pub(super) prompts: Prompts,
    pub(super) settings: IvaConfig,
    pub(super) journal_dir: PathBuf,
    pub(super) calendar: Option<CalendarClient>,
    pub(super) tasks: Option<TasksClient>,
    /// Shown by `/status`, e.g. "speech in, elevenlabs out".
    pub(super) voice_label: String,
    pub(super) focus: FocusTimer,
    focus_notices: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    pub(super) uptime: Instant,
    /// Tracks senders with a message in flight. New messages are buffered here.
    pub(super) active_senders: Mutex<HashMap<String, Vec<IncomingMessage>>>,
    /// Reminders / tasks waiting for a yes or no, per sender.
    pub(super) pending: Mutex<HashMap<String, PendingAction>>,
    /// Raised when the user says a stop phrase.
    pub(super) stop: Notify,
}

impl Gateway {
    /// Create a new gateway without Google integration.
    pub fn new(
        provider: Arc<dyn Provider>,
        channels: HashMap<String, Arc<dyn Channel>>,
        memory: Store,
        prompts: Prompts,
        config: &Config,
    ) -> Self {
        let audit = AuditLogger::new(memory.pool().clone());
        let (focus, focus_notices) = FocusTimer::new(&config.focus);
        let voice_label = format!(
            "{} in, {} out",
            match config.voice.input_mode {
                InputMode::Text => "text",
                InputMode::Speech => "speech",
            },
            config.voice.tts_engine.display_name()
        );
        Self {
            provider,
            channels,
            memory,
            audit,
            prompts,
            settings: config.iva.clone(),
            journal_dir: config.iva.journal_dir(),
            calendar: None,
            tasks: None,
            voice_label,
            focus,
            focus_notices: Mutex::new(Some(focus_notices)),
            uptime: Instant::now(),
            active_senders: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            stop: Notify::new(),
        }
    }

    /// Attach the Google Calendar and Tasks clients.
    pub fn with_google(
        mut self,
        calendar: Option<CalendarClient>,
        tasks: Option<TasksClient>,
    ) -> Self {
        self.calendar = calendar;
        self.tasks = tasks;
        self
    }

    /// Write journal files somewhere other than `<data_dir>/journal`.
    pub fn with_journal_dir(mut self, dir: PathBuf) -> Self {
        self.journal_dir = dir;
        self
    }

    /// Where confirmed reminders and tasks for `sender_id` are written.
    pub(super) fn outlets<'a>(&'a self, sender_id: &'a str) -> Outlets<'a> {
        Outlets {
            journal_dir: &self.journal_dir,
            store: &self.memory,
            sender_id,
            calendar: self.calendar.as_ref(),
            tasks: self.tasks.as_ref(),
        }
    }

    /// Run the main event loop until a stop phrase, Ctrl-C, or every channel closes.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "IVA gateway running | provider: {} | channels: {} | google: {} | voice: {}",
            self.provider.name(),
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            if self.calendar.is_some() {
                "enabled"
            } else {
                "disabled"
            },
            self.voice_label,
        );

        // Greet before input starts so speech mode does not record the greeting.
        if !self.settings.greeting.is_empty() {
            self.broadcast(&self.settings.greeting).await;
        }

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        let mut notices = self.focus_notices.lock().await.take();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                incoming = rx.recv() => match incoming {
                    Some(incoming) => {
                        let gw = self.clone();
                        in_flight.spawn(async move {
                            gw.dispatch_message(incoming).await;
                        });
                    }
                    None => {
                        info!("all channels closed");
                        break;
                    }
                },
                Some(notice) = next_notice(&mut notices) => {
                    self.broadcast(&notice).await;
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = result {
                        error!("message task failed: {e}");
                    }
                }
                _ = self.stop.notified() => {
                    info!("stop phrase received");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("in-flight messages did not finish within {DRAIN_TIMEOUT:?}, aborting");
            in_flight.abort_all();
        }

        self.shutdown().await;
        Ok(())
    }

    /// Dispatch a message: buffer if the sender is busy, otherwise process.
    pub(super) async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                buffer.push(incoming);
                info!("buffered message from {sender_key} (one already in flight)");
                return;
            }
            active.insert(sender_key.clone(), Vec::new());
        }

        self.handle_message(incoming).await;

        // Drain anything that arrived meanwhile.
        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                match active.get_mut(&sender_key) {
                    Some(buf) if !buf.is_empty() => Some(buf.remove(0)),
                    _ => {
                        active.remove(&sender_key);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message from {sender_key}");
                    self.handle_message(buffered).await;
                }
                None => break,
            }
        }
    }

    /// Graceful shutdown: stop the focus timer and every channel.
    async fn shutdown(&self) {
        info!("Shutting down...");
        self.focus.reset();

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send a plain text message back to the sender's channel.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(OutgoingMessage::text(text)).await {
                error!("failed to send message: {e}");
            }
        }
    }

    /// Send a message to every channel (greeting, focus notices).
    async fn broadcast(&self, text: &str) {
        for (name, channel) in &self.channels {
            if let Err(e) = channel.send(OutgoingMessage::text(text)).await {
                error!("failed to send to {name}: {e}");
            }
        }
    }
}

async fn next_notice(rx: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
