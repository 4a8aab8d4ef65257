use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::app::Control;

/// UI refresh cadence. The drill clock itself advances in whole seconds.
pub const TICK_RATE_MS: u64 = 100;

#[derive(Clone, Debug)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within one refresh interval
    Tick,
}

/// Queue of drill events, filled either by a terminal reader thread or by hand
pub struct EventSource {
    rx: Receiver<DrillEvent>,
}

impl EventSource {
    /// Keys and resizes from the terminal. Key releases are dropped so each press counts once.
    pub fn terminal() -> Self {
        let (tx, source) = Self::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => DrillEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => DrillEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(event).is_err() {
                break;
            }
        });

        source
    }

    /// A source fed through the returned sender; used for scripted and headless runs
    pub fn channel() -> (Sender<DrillEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    fn next_within(&self, timeout: Duration) -> Option<DrillEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Pulls events off a source, filling quiet periods with ticks
pub struct Runner {
    events: EventSource,
    refresh: Duration,
}

impl Runner {
    pub fn new(events: EventSource) -> Self {
        Self::with_refresh(events, Duration::from_millis(TICK_RATE_MS))
    }

    pub fn with_refresh(events: EventSource, refresh: Duration) -> Self {
        Self { events, refresh }
    }

    /// The next event, or `Tick` once the refresh interval passes without one.
    /// A closed source keeps ticking, at most once per interval.
    pub fn step(&self) -> DrillEvent {
        match self.events.next_within(self.refresh) {
            Some(event) => event,
            None => DrillEvent::Tick,
        }
    }

    /// Hand events to `handle` until it returns `Control::Quit` or an error
    pub fn run<E>(
        &self,
        mut handle: impl FnMut(DrillEvent) -> Result<Control, E>,
    ) -> Result<(), E> {
        loop {
            if handle(self.step())? == Control::Quit {
                return Ok(());
            }
        }
    }
}

/// Converts irregular UI ticks into a count of whole elapsed seconds.
///
/// Sub-second remainders carry over, so a 100 ms ticker yields one second per ten polls
/// without drifting.
#[derive(Clone, Copy, Debug)]
pub struct SecondClock {
    last: Instant,
    carry: Duration,
}

impl SecondClock {
    pub fn new(now: Instant) -> Self {
        Self {
            last: now,
            carry: Duration::ZERO,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
        self.carry = Duration::ZERO;
    }

    /// Whole seconds elapsed since the previous poll (plus carried remainder)
    pub fn poll(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last) + self.carry;
        self.last = now;

        let whole = elapsed.as_secs();
        self.carry = elapsed - Duration::from_secs(whole);
        whole as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_runner() -> (Sender<DrillEvent>, Runner) {
        let (tx, source) = EventSource::channel();
        (tx, Runner::with_refresh(source, Duration::from_millis(1)))
    }

    #[test]
    fn step_ticks_when_nothing_arrives() {
        let (_tx, runner) = quick_runner();
        assert!(matches!(runner.step(), DrillEvent::Tick));
    }

    #[test]
    fn step_ticks_after_the_sender_is_gone() {
        let (tx, runner) = quick_runner();
        drop(tx);
        assert!(matches!(runner.step(), DrillEvent::Tick));
        assert!(matches!(runner.step(), DrillEvent::Tick));
    }

    #[test]
    fn step_passes_events_through_in_order() {
        let (tx, runner) = quick_runner();
        tx.send(DrillEvent::Resize).unwrap();
        tx.send(DrillEvent::Tick).unwrap();

        assert!(matches!(runner.step(), DrillEvent::Resize));
        assert!(matches!(runner.step(), DrillEvent::Tick));
    }

    #[test]
    fn run_stops_on_quit() {
        let (tx, runner) = quick_runner();
        for _ in 0..3 {
            tx.send(DrillEvent::Resize).unwrap();
        }

        let mut seen = 0;
        let result: Result<(), String> = runner.run(|event| {
            if let DrillEvent::Resize = event {
                seen += 1;
            }
            Ok(if seen == 3 { Control::Quit } else { Control::Continue })
        });

        assert_eq!(result, Ok(()));
        assert_eq!(seen, 3);
    }

    #[test]
    fn run_returns_handler_errors() {
        let (_tx, runner) = quick_runner();
        let mut ticks = 0;

        let result = runner.run(|_| {
            ticks += 1;
            if ticks == 5 {
                Err("draw failed")
            } else {
                Ok(Control::Continue)
            }
        });

        assert_eq!(result, Err("draw failed"));
        assert_eq!(ticks, 5);
    }

    #[test]
    fn second_clock_accumulates_sub_second_polls() {
        let start = Instant::now();
        let mut clock = SecondClock::new(start);

        let mut seconds = 0;
        for i in 1..=25u64 {
            seconds += clock.poll(start + Duration::from_millis(i * 100));
        }
        assert_eq!(seconds, 2);
    }

    #[test]
    fn second_clock_reports_large_gaps() {
        let start = Instant::now();
        let mut clock = SecondClock::new(start);

        assert_eq!(clock.poll(start + Duration::from_millis(3_500)), 3);
        assert_eq!(clock.poll(start + Duration::from_millis(4_000)), 1);
        assert_eq!(clock.poll(start + Duration::from_millis(4_000)), 0);
    }

    #[test]
    fn second_clock_reset_drops_carry() {
        let start = Instant::now();
        let mut clock = SecondClock::new(start);
        assert_eq!(clock.poll(start + Duration::from_millis(900)), 0);

        let later = start + Duration::from_secs(10);
        clock.reset(later);
        assert_eq!(clock.poll(later + Duration::from_millis(200)), 0);
        assert_eq!(clock.poll(later + Duration::from_millis(1_100)), 1);
    }
}
