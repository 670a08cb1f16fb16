//! Rotating progress indicator.

use std::time::{Duration, Instant};

/// ASCII spinner.
pub const ASCII_SYMBOLS: &str = "|/-\\";

/// Unicode block ramp, rising then falling.
pub const UNICODE_SYMBOLS: &str =
    "\u{2581}\u{2582}\u{2583}\u{2584}\u{2585}\u{2586}\u{2587}\u{2588}\u{2587}\u{2586}\u{2585}\u{2584}\u{2583}\u{2582}";

const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Hands out the next spinner symbol, at most once per interval.
///
/// Purely observational: callers poll [`tick`](Self::tick) from their work
/// loop and the optional callback is invoked with each emitted symbol.
pub struct ProgressIndicator<'a> {
    symbols: Vec<char>,
    count: usize,
    interval: Duration,
    last: Instant,
    callback: Option<Box<dyn FnMut(char) + 'a>>,
}

impl<'a> ProgressIndicator<'a> {
    /// Indicator cycling through `symbols` every 100 ms.
    #[must_use]
    pub fn new(symbols: &str) -> Self {
        Self::with_interval(symbols, DEFAULT_INTERVAL)
    }

    /// Indicator with a custom minimum interval between symbols.
    #[must_use]
    pub fn with_interval(symbols: &str, interval: Duration) -> Self {
        Self {
            symbols: symbols.chars().collect(),
            count: 0,
            interval,
            last: Instant::now(),
            callback: None,
        }
    }

    /// Invoke `callback` with every emitted symbol.
    #[must_use]
    pub fn on_tick(mut self, callback: impl FnMut(char) + 'a) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Next symbol, if the interval has passed since the previous one.
    pub fn tick(&mut self) -> Option<char> {
        let now = Instant::now();
        if now.duration_since(self.last) < self.interval || self.symbols.is_empty() {
            return None;
        }
        self.last = now;
        let sign = self.symbols[self.count % self.symbols.len()];
        self.count = self.count.wrapping_add(1);
        if let Some(callback) = self.callback.as_mut() {
            callback(sign);
        }
        Some(sign)
    }
}

impl std::fmt::Debug for ProgressIndicator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressIndicator")
            .field("symbols", &self.symbols)
            .field("count", &self.count)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
