use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use log::warn;

/// Event loop resolution. The session's own schedules turn these ticks into
/// one-second countdown steps and periodic wpm samples.
pub const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub enum TypingEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Anything that can hand the loop its next event within a deadline
pub trait EventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TypingEvent, RecvTimeoutError>;
}

impl EventSource for Receiver<TypingEvent> {
    fn recv_timeout(&self, timeout: Duration) -> Result<TypingEvent, RecvTimeoutError> {
        Receiver::recv_timeout(self, timeout)
    }
}

/// Only key presses type; release and repeat reports would double every
/// keystroke on terminals that send them.
pub fn translate(event: Event) -> Option<TypingEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(TypingEvent::Key(key)),
        Event::Resize(_, _) => Some(TypingEvent::Resize),
        _ => None,
    }
}

/// Reads crossterm events on a background thread until the receiver is dropped
/// or the terminal stream fails.
pub fn terminal_events() -> Receiver<TypingEvent> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || loop {
        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                warn!("terminal event stream closed: {e}");
                break;
            }
        };

        if let Some(event) = translate(event) {
            if tx.send(event).is_err() {
                break;
            }
        }
    });

    rx
}

pub struct Runner<E: EventSource> {
    source: E,
    tick_rate: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(source: E, tick_rate: Duration) -> Self {
        Self { source, tick_rate }
    }

    /// Waits up to one tick for an event. A quiet or closed source yields Tick.
    pub fn step(&self) -> TypingEvent {
        self.source
            .recv_timeout(self.tick_rate)
            .unwrap_or(TypingEvent::Tick)
    }
}
