use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pinyin_drill::app::{App, AppState, Control, DrillSettings};
use pinyin_drill::deck::{DeckEntry, DeckSet};
use pinyin_drill::difficulty::{Difficulty, ToneMode};
use pinyin_drill::runtime::{DrillEvent, EventSource, Runner};
use pinyin_drill::session::{Outcome, Phase, Session};

fn decks() -> DeckSet {
    DeckSet {
        easy: vec![DeckEntry::new("愛", "ài").with_toneless("ai")],
        medium: vec![DeckEntry::new("你好", "nǐ hǎo").with_toneless("ni hao")],
        hard: vec![DeckEntry::new("太貴了。", "tài guì le.").with_toneless("tai gui le.")],
    }
}

fn key(code: KeyCode) -> DrillEvent {
    DrillEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Headless integration using the internal runtime + App without a TTY
// Verifies that typed keys flow through a channel-fed Runner into a judged card.
#[test]
fn headless_drill_flow_answers_and_quits() {
    let settings = DrillSettings {
        difficulty: Difficulty::Easy,
        tone_mode: ToneMode::Toneless,
        save_history: false,
    };
    let mut app = App::new(settings, decks(), None);

    let (tx, events) = EventSource::channel();
    let runner = Runner::with_refresh(events, Duration::from_millis(5));

    for c in "ai".chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();

    let mut steps = 0u32;
    let result: Result<(), &str> = runner.run(|event| {
        steps += 1;
        if steps > 100 {
            return Err("escape should stop the loop");
        }
        Ok(match event {
            DrillEvent::Key(k) => app.handle_key(k, Instant::now()),
            DrillEvent::Tick => {
                app.on_tick(Instant::now());
                Control::Continue
            }
            DrillEvent::Resize => Control::Continue,
        })
    });

    assert_eq!(result, Ok(()));
    assert_eq!(steps, 5);
    assert_eq!(app.session.correct_count(), 1);
    assert_eq!(app.session.log()[0].outcome, Outcome::Correct);
    assert!(app.input.is_empty(), "advancing clears the answer");
    assert_eq!(app.state, AppState::Drill);
}

#[test]
fn headless_timed_session_finishes_by_ticks() {
    let mut session = Session::new();
    session.start(Difficulty::Medium, ToneMode::Toned, &decks());

    let (_tx, events) = EventSource::channel();
    let runner = Runner::with_refresh(events, Duration::from_millis(1));

    // each runner tick stands in for one elapsed second
    let mut steps = 0;
    while session.phase() == Phase::Running && steps < 200 {
        if let DrillEvent::Tick = runner.step() {
            session.tick();
        }
        steps += 1;
    }

    assert_eq!(steps, 90);
    assert!(session.has_ended());
    assert_eq!(session.summary().unwrap().score, 0);
}

#[test]
fn headless_app_reaches_results_from_wall_clock() {
    let start = Instant::now();
    let settings = DrillSettings {
        difficulty: Difficulty::Hard,
        tone_mode: ToneMode::Toned,
        save_history: false,
    };
    let mut app = App::new(settings, decks(), None);
    app.restart(start);

    app.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE), start);
    for tenth in 1..=1200u64 {
        app.on_tick(start + Duration::from_millis(tenth * 100));
    }

    assert_eq!(app.state, AppState::Results);
    let summary = app.summary.as_ref().unwrap();
    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.skipped[0].prompt, "太貴了。");
}
