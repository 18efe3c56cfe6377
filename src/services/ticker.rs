//! One-second repeating timer feeding the control loop.

use crate::app::AppMessage;
use crate::config::TICK_INTERVAL_MS;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Posts `AppMessage::Tick` every interval while running.
///
/// Every start/stop bumps the generation; ticks from an older generation
/// were already in the channel when the timer stopped and must be dropped
/// by the receiver.
pub struct Ticker {
    sender: Sender<AppMessage>,
    interval: Duration,
    generation: u64,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl Ticker {
    pub fn new(sender: Sender<AppMessage>) -> Self {
        Self::with_interval(sender, Duration::from_millis(TICK_INTERVAL_MS))
    }

    pub fn with_interval(sender: Sender<AppMessage>, interval: Duration) -> Self {
        Self {
            sender,
            interval,
            generation: 0,
            stop_flag: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop_flag.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.is_running() && generation == self.generation
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let stop = Arc::new(AtomicBool::new(false));
        self.stop_flag = Some(stop.clone());
        let sender = self.sender.clone();
        let interval = self.interval;

        debug!("Timer started (generation {})", generation);
        thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                if sender.send(AppMessage::Tick { generation }).is_err() {
                    break;
                }
            }
        });
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop_flag.take() {
            stop.store(true, Ordering::Relaxed);
            self.generation += 1;
            debug!("Timer stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn ticks_carry_current_generation() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(tx, Duration::from_millis(5));
        ticker.start();
        let generation = ticker.generation();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppMessage::Tick { generation: g } => assert!(ticker.is_current(g)),
            _ => panic!("expected a tick"),
        }
        assert_eq!(ticker.generation(), generation);
    }

    #[test]
    fn ticks_in_flight_after_stop_are_stale() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(tx, Duration::from_millis(5));
        ticker.start();
        let _ = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        ticker.stop();

        assert!(!ticker.is_running());
        while let Ok(AppMessage::Tick { generation }) = rx.recv_timeout(Duration::from_millis(50)) {
            assert!(!ticker.is_current(generation));
        }
    }

    #[test]
    fn start_is_idempotent() {
        let (tx, _rx) = mpsc::channel();
        let mut ticker = Ticker::with_interval(tx, Duration::from_millis(50));
        ticker.start();
        let generation = ticker.generation();
        ticker.start();
        assert_eq!(ticker.generation(), generation);
    }
}
