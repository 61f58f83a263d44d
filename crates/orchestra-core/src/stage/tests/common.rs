use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

use crate::player::{Player, PlayerResult};

/// Shared, ordered record of lifecycle calls across players.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries for one phase, e.g. `"clean"`, stripped to the player name.
    pub fn phase(&self, phase: &str) -> Vec<String> {
        let prefix = format!("{}:", phase);
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

/// How many times each lifecycle method was called.
#[derive(Default, Debug)]
pub struct Calls {
    setup: AtomicUsize,
    play: AtomicUsize,
    played: AtomicUsize,
    clean: AtomicUsize,
}

impl Calls {
    pub fn setup(&self) -> usize {
        self.setup.load(Ordering::SeqCst)
    }

    /// Number of `play` calls started.
    pub fn play(&self) -> usize {
        self.play.load(Ordering::SeqCst)
    }

    /// Number of `play` calls that ran to their return point.
    pub fn played(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }

    pub fn clean(&self) -> usize {
        self.clean.load(Ordering::SeqCst)
    }
}

/// Configurable player used across the stage tests.
pub struct MockPlayer {
    name: String,
    calls: Arc<Calls>,
    journal: Option<Journal>,
    setup_error: Option<String>,
    play_error: Option<String>,
    play_delay: Option<Duration>,
    wait_for_cancel: bool,
    panic_on_setup: bool,
    panic_on_play: bool,
    panic_on_clean: bool,
    play_barrier: Option<Arc<Barrier>>,
    clean_barrier: Option<Arc<Barrier>>,
}

impl MockPlayer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(Calls::default()),
            journal: None,
            setup_error: None,
            play_error: None,
            play_delay: None,
            wait_for_cancel: false,
            panic_on_setup: false,
            panic_on_play: false,
            panic_on_clean: false,
            play_barrier: None,
            clean_barrier: None,
        }
    }

    pub fn calls(&self) -> Arc<Calls> {
        self.calls.clone()
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn failing_setup(mut self, message: &str) -> Self {
        self.setup_error = Some(message.to_string());
        self
    }

    pub fn failing_play(mut self, message: &str) -> Self {
        self.play_error = Some(message.to_string());
        self
    }

    pub fn with_play_delay(mut self, delay: Duration) -> Self {
        self.play_delay = Some(delay);
        self
    }

    pub fn until_cancelled(mut self) -> Self {
        self.wait_for_cancel = true;
        self
    }

    pub fn panicking_setup(mut self) -> Self {
        self.panic_on_setup = true;
        self
    }

    pub fn panicking_play(mut self) -> Self {
        self.panic_on_play = true;
        self
    }

    pub fn panicking_clean(mut self) -> Self {
        self.panic_on_clean = true;
        self
    }

    pub fn with_play_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.play_barrier = Some(barrier);
        self
    }

    pub fn with_clean_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.clean_barrier = Some(barrier);
        self
    }

    fn record(&self, phase: &str) {
        if let Some(journal) = &self.journal {
            journal.record(format!("{}:{}", phase, self.name));
        }
    }
}

#[async_trait]
impl Player for MockPlayer {
    async fn setup(&self) -> PlayerResult {
        self.calls.setup.fetch_add(1, Ordering::SeqCst);
        self.record("setup");
        if self.panic_on_setup {
            panic!("player '{}' failed to start", self.name);
        }
        match &self.setup_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn play(&self, ctx: &CancellationToken) -> PlayerResult {
        self.calls.play.fetch_add(1, Ordering::SeqCst);
        self.record("play");
        if let Some(barrier) = &self.play_barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.play_delay {
            tokio::time::sleep(delay).await;
        }
        if self.wait_for_cancel {
            ctx.cancelled().await;
        }
        if self.panic_on_play {
            panic!("player '{}' blew up", self.name);
        }
        self.calls.played.fetch_add(1, Ordering::SeqCst);
        match &self.play_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn clean(&self) {
        self.calls.clean.fetch_add(1, Ordering::SeqCst);
        self.record("clean");
        if let Some(barrier) = &self.clean_barrier {
            barrier.wait().await;
        }
        if self.panic_on_clean {
            panic!("player '{}' failed to clean", self.name);
        }
    }
}
