//! Terminal channel: typed lines or spoken turns in, printed (and optionally
//! spoken) replies out.

use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use console::{style, Term};
use iva_core::{
    error::IvaError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use iva_voice::{Listener, Speaker};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::{mpsc, Notify},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub const CHANNEL_NAME: &str = "console";
pub const LOCAL_SENDER: &str = "local";

type Input = Box<dyn AsyncRead + Send + Unpin>;

pub struct ConsoleChannel {
    assistant_name: String,
    listener: Option<Arc<Listener>>,
    speaker: Option<Arc<dyn Speaker>>,
    input: Mutex<Option<Input>>,
    /// Released after each reply (and its playback) so speech mode records one turn at a time.
    turn_done: Arc<Notify>,
    running: Arc<AtomicBool>,
    typing: Mutex<Option<JoinHandle<()>>>,
    term: Term,
}

impl ConsoleChannel {
    /// Read typed lines from stdin.
    pub fn text(assistant_name: &str) -> Self {
        Self::build(assistant_name, None)
    }

    /// Record and transcribe speech turns.
    pub fn speech(assistant_name: &str, listener: Arc<Listener>) -> Self {
        Self::build(assistant_name, Some(listener))
    }

    fn build(assistant_name: &str, listener: Option<Arc<Listener>>) -> Self {
        Self {
            assistant_name: assistant_name.to_string(),
            listener,
            speaker: None,
            input: Mutex::new(None),
            turn_done: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            typing: Mutex::new(None),
            term: Term::stdout(),
        }
    }

    /// Speak every reply after printing it.
    pub fn with_speaker(mut self, speaker: Option<Arc<dyn Speaker>>) -> Self {
        self.speaker = speaker;
        self
    }

    /// Read text input from `reader` instead of stdin.
    pub fn with_input(self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        if let Ok(mut input) = self.input.lock() {
            *input = Some(Box::new(reader));
        }
        self
    }

    fn take_input(&self) -> Option<Input> {
        self.input.lock().ok().and_then(|mut i| i.take())
    }

    fn spawn_text_loop(&self, tx: mpsc::Sender<IncomingMessage>) {
        match self.take_input() {
            Some(reader) => spawn_reader_loop(reader, self.running.clone(), tx),
            None => spawn_stdin_thread(self.running.clone(), tx),
        }
    }

    fn spawn_speech_loop(&self, listener: Arc<Listener>, tx: mpsc::Sender<IncomingMessage>) {
        let running = self.running.clone();
        let turn_done = self.turn_done.clone();
        let name = self.assistant_name.clone();
        tokio::spawn(async move {
            while running.load(Ordering::Relaxed) {
                let heard = listener
                    .listen(|prompt| println!("{}", format_reply(&name, prompt)))
                    .await;
                match heard {
                    Ok(Some(text)) => {
                        println!("{} {text}", style("You:").bold());
                        let Some(msg) = incoming_from_line(&text, true) else {
                            continue;
                        };
                        // Armed before sending so a fast reply is not missed.
                        let done = turn_done.notified();
                        tokio::pin!(done);
                        done.as_mut().enable();
                        if tx.send(msg).await.is_err() {
                            break;
                        }
                        done.await;
                    }
                    Ok(None) => debug!("no speech recognised, listening again"),
                    Err(e) => {
                        warn!("speech input failed: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }
}

fn spawn_reader_loop(reader: Input, running: Arc<AtomicBool>, tx: mpsc::Sender<IncomingMessage>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while running.load(Ordering::Relaxed) {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(msg) = incoming_from_line(&line, false) else {
                        continue;
                    };
                    if tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("console input closed");
                    break;
                }
                Err(e) => {
                    warn!("console read error: {e}");
                    break;
                }
            }
        }
    });
}

/// Stdin is read on a plain OS thread: a pending read there does not hold up
/// runtime shutdown after the session ends.
fn spawn_stdin_thread(running: Arc<AtomicBool>, tx: mpsc::Sender<IncomingMessage>) {
    let spawned = std::thread::Builder::new()
        .name("iva-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                match line {
                    Ok(line) => {
                        let Some(msg) = incoming_from_line(&line, false) else {
                            continue;
                        };
                        if tx.blocking_send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                }
            }
            info!("console input closed");
        });
    if let Err(e) = spawned {
        warn!("cannot start console input thread: {e}");
    }
}

/// Turn one line of user input into a message, skipping blank lines.
pub fn incoming_from_line(line: &str, from_voice: bool) -> Option<IncomingMessage> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }
    let mut msg = IncomingMessage::new(CHANNEL_NAME, LOCAL_SENDER, text);
    msg.from_voice = from_voice;
    Some(msg)
}

/// `IVA: <text>`
pub fn format_reply(assistant_name: &str, text: &str) -> String {
    format!("{}: {text}", style(assistant_name).cyan().bold())
}

#[async_trait]
impl Channel for ConsoleChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, IvaError> {
        if self.running.swap(true, Ordering::Relaxed) {
            return Err(IvaError::Channel("console channel already started".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        match &self.listener {
            Some(listener) => {
                info!("console channel listening for speech");
                self.spawn_speech_loop(listener.clone(), tx);
            }
            None => {
                info!("console channel reading text input");
                self.spawn_text_loop(tx);
            }
        }
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), IvaError> {
        self.stop_typing().await?;
        println!("{}", format_reply(&self.assistant_name, &message.text));
        if let Some(speaker) = &self.speaker {
            if let Err(e) = speaker.speak(&message.text).await {
                warn!("{} could not speak the reply: {e}", speaker.name());
            }
        }
        self.turn_done.notify_waiters();
        Ok(())
    }

    async fn send_typing(&self) -> Result<(), IvaError> {
        let term = self.term.clone();
        let label = format!("{} is typing", self.assistant_name);
        let handle = tokio::spawn(async move {
            let mut dots = 0usize;
            loop {
                dots = dots % 3 + 1;
                let frame = format!("{label}{}", ".".repeat(dots));
                if term.clear_line().is_err() || term.write_str(&frame).is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(400)).await;
            }
        });
        let previous = self
            .typing
            .lock()
            .map_err(|_| IvaError::Channel("typing state poisoned".into()))?
            .replace(handle);
        if let Some(old) = previous {
            old.abort();
        }
        Ok(())
    }

    async fn stop_typing(&self) -> Result<(), IvaError> {
        let handle = self
            .typing
            .lock()
            .map_err(|_| IvaError::Channel("typing state poisoned".into()))?
            .take();
        if let Some(handle) = handle {
            handle.abort();
            self.term.clear_line()?;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), IvaError> {
        self.running.store(false, Ordering::Relaxed);
        self.stop_typing().await?;
        self.turn_done.notify_waiters();
        Ok(())
    }
}
