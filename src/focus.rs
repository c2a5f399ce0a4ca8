//! Focus (pomodoro) timer: alternating work and break periods.
//!
//! The timer runs on a background task that sleeps until the current period
//! ends, flips the phase and pushes a notice through an unbounded channel the
//! gateway drains.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use iva_core::config::FocusConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// How much `longer` / `shorter` move the work period.
const STEP: Duration = Duration::from_secs(5 * 60);
const MIN_WORK: Duration = Duration::from_secs(5 * 60);
/// Ceiling above the configured work length.
const MAX_EXTRA: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }
}

#[derive(Debug)]
struct FocusState {
    phase: Phase,
    work: Duration,
    rest: Duration,
    /// Time left in the period as of `started` (or now, when paused).
    remaining: Duration,
    started: Option<Instant>,
}

impl FocusState {
    fn left(&self, now: Instant) -> Duration {
        match self.started {
            Some(t) => self.remaining.saturating_sub(now.saturating_duration_since(t)),
            None => self.remaining,
        }
    }

    /// Move to the next period, keeping the running/paused state.
    fn advance(&mut self, now: Instant) -> String {
        let notice = match self.phase {
            Phase::Work => {
                self.phase = Phase::Break;
                self.remaining = self.rest;
                format!("Time for a break! {} minutes.", minutes(self.rest))
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.remaining = self.work;
                format!("Break is over. Next focus block: {} minutes.", minutes(self.work))
            }
        };
        if self.started.is_some() {
            self.started = Some(now);
        }
        notice
    }
}

fn minutes(d: Duration) -> u64 {
    d.as_secs() / 60
}

/// `mm:ss`
fn clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub struct FocusTimer {
    state: Arc<Mutex<FocusState>>,
    default_work: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
    notices: mpsc::UnboundedSender<String>,
}

impl FocusTimer {
    /// Create an idle timer and the receiver its period notices arrive on.
    pub fn new(config: &FocusConfig) -> (Self, mpsc::UnboundedReceiver<String>) {
        let work = Duration::from_secs(config.work_minutes.max(1).saturating_mul(60));
        let rest = Duration::from_secs(config.break_minutes.max(1).saturating_mul(60));
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = Self {
            state: Arc::new(Mutex::new(FocusState {
                phase: Phase::Work,
                work,
                rest,
                remaining: work,
                started: None,
            })),
            default_work: work,
            ticker: Mutex::new(None),
            notices: tx,
        };
        (timer, rx)
    }

    fn lock(&self) -> MutexGuard<'_, FocusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_ticker(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().started.is_some()
    }

    pub fn start(&self) -> String {
        let now = Instant::now();
        {
            let mut s = self.lock();
            if s.started.is_some() {
                return format!(
                    "Focus timer is already running ({} {} left).",
                    s.phase.label(),
                    clock(s.left(now))
                );
            }
            s.started = Some(now);
        }

        let state = self.state.clone();
        let notices = self.notices.clone();
        let handle = tokio::spawn(async move {
            loop {
                let wait = {
                    let s = state.lock().unwrap_or_else(PoisonError::into_inner);
                    s.left(Instant::now())
                };
                tokio::time::sleep(wait).await;
                let notice = {
                    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
                    s.advance(Instant::now())
                };
                info!("focus: {notice}");
                if notices.send(notice).is_err() {
                    debug!("focus notice receiver gone, stopping ticker");
                    break;
                }
            }
        });
        *self.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        let s = self.lock();
        format!(
            "Focus started: {} of {}.",
            clock(s.remaining),
            s.phase.label()
        )
    }

    pub fn pause(&self) -> String {
        let now = Instant::now();
        let message = {
            let mut s = self.lock();
            if s.started.is_none() {
                return "Focus timer is not running.".to_string();
            }
            s.remaining = s.left(now);
            s.started = None;
            format!(
                "Focus paused with {} of {} left.",
                clock(s.remaining),
                s.phase.label()
            )
        };
        self.stop_ticker();
        message
    }

    pub fn reset(&self) -> String {
        self.stop_ticker();
        let mut s = self.lock();
        s.phase = Phase::Work;
        s.remaining = s.work;
        s.started = None;
        format!("Focus timer reset to {} minutes of work.", minutes(s.work))
    }

    pub fn status(&self) -> String {
        let s = self.lock();
        let state = if s.started.is_some() { "running" } else { "paused" };
        format!(
            "Focus {}: {} left ({state}).",
            s.phase.label(),
            clock(s.left(Instant::now()))
        )
    }

    /// Lengthen the work period by one step.
    pub fn longer(&self) -> String {
        self.adjust(true)
    }

    /// Shorten the work period by one step.
    pub fn shorter(&self) -> String {
        self.adjust(false)
    }

    fn adjust(&self, longer: bool) -> String {
        let ceiling = self.default_work + MAX_EXTRA;
        let mut s = self.lock();
        let work = if longer {
            (s.work + STEP).min(ceiling)
        } else {
            s.work.saturating_sub(STEP).max(MIN_WORK)
        };
        s.work = work;
        // An idle work period picks up the new length straight away.
        if s.phase == Phase::Work && s.started.is_none() {
            s.remaining = work;
        }
        format!("Work period set to {} minutes.", minutes(work))
    }
}

impl Drop for FocusTimer {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
