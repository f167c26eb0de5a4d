use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if one arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// A `Tick` is only produced when the source stays quiet for a full
/// interval, so ticks are not a clock: the app measures elapsed wall time
/// itself and a tick only marks "time to look at the clock and redraw".
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

/// Converts wall-clock time into whole-second engine ticks.
///
/// `Runner` ticks fire on quiet timeouts, not on a fixed cadence, so the
/// clock anchors an `Instant` and hands out the whole seconds that really
/// elapsed, carrying the sub-second remainder forward. Missed or delayed
/// ticks therefore never lose countdown time.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    anchor: std::time::Instant,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            anchor: std::time::Instant::now(),
        }
    }

    /// Restart measuring from now (called when a countdown starts).
    pub fn reset(&mut self) {
        self.anchor = std::time::Instant::now();
    }

    /// Whole seconds elapsed since the last take; the fractional remainder
    /// stays on the anchor.
    pub fn take_whole_secs(&mut self) -> u64 {
        self.take_whole_secs_at(std::time::Instant::now())
    }

    fn take_whole_secs_at(&mut self, now: std::time::Instant) -> u64 {
        let whole = now.saturating_duration_since(self.anchor).as_secs();
        if whole > 0 {
            self.anchor += Duration::from_secs(whole);
        }
        whole
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
