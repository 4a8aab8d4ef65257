// Engine-level properties checked against the public Session API with seeded RNGs.

use std::collections::HashMap;

use assert_matches::assert_matches;
use pinyin_drill::deck::{DeckEntry, DeckSet};
use pinyin_drill::difficulty::{Difficulty, ToneMode};
use pinyin_drill::session::{Advance, Outcome, Phase, Session};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn three_card_decks() -> DeckSet {
    let tier = vec![
        DeckEntry::new("八", "bā").with_toneless("ba"),
        DeckEntry::new("你", "nǐ").with_toneless("ni"),
        DeckEntry::new("愛", "ài").with_toneless("ai"),
    ];
    DeckSet {
        easy: tier.clone(),
        medium: tier.clone(),
        hard: tier,
    }
}

fn prompts(session: &Session<StdRng>) -> Vec<String> {
    session.deck().iter().map(|c| c.prompt.clone()).collect()
}

#[test]
fn deck_is_a_permutation_of_the_tier() {
    let decks = DeckSet::builtin().unwrap();
    let mut session = Session::with_rng(StdRng::seed_from_u64(7));

    for difficulty in Difficulty::ALL {
        session.start(difficulty, ToneMode::Toned, &decks);

        let mut dealt = prompts(&session);
        let mut expected: Vec<String> = match difficulty {
            Difficulty::Easy => &decks.easy,
            Difficulty::Medium => &decks.medium,
            Difficulty::Hard => &decks.hard,
        }
        .iter()
        .map(|e| e.prompt.clone())
        .collect();

        dealt.sort();
        expected.sort();
        assert_eq!(dealt, expected, "{difficulty} deck");
    }
}

#[test]
fn shuffle_orders_are_roughly_uniform() {
    const TRIALS: usize = 6000;
    let decks = three_card_decks();
    let mut session = Session::with_rng(StdRng::seed_from_u64(2024));
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();

    for _ in 0..TRIALS {
        session.start(Difficulty::Easy, ToneMode::Toneless, &decks);
        *counts.entry(prompts(&session)).or_default() += 1;
    }

    assert_eq!(counts.len(), 6, "all 3! orders should appear");

    let expected = TRIALS as f64 / 6.0;
    let chi_square: f64 = counts
        .values()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    // 5 degrees of freedom, p = 0.001
    assert!(chi_square < 20.52, "chi-square {chi_square:.2} too large");
}

#[test]
fn worked_example_scores_46_on_easy() {
    let decks = DeckSet {
        easy: vec![DeckEntry::new("愛", "ài").with_toneless("ai")],
        medium: vec![DeckEntry::new("你好", "nǐ hǎo")],
        hard: vec![DeckEntry::new("太貴了。", "tài guì le.")],
    };
    let mut session = Session::with_rng(StdRng::seed_from_u64(1));
    session.start_named("easy", "toneless", &decks);

    assert_eq!(session.submit_answer("  AI "), Some(Outcome::Correct));
    assert_eq!(session.score(), 46);

    let mut last = Phase::Running;
    for _ in 0..360 {
        last = session.tick();
    }
    assert_eq!(last, Phase::Ended);

    let summary = session.summary().unwrap();
    assert_eq!(summary.score, 46);
    assert_eq!(summary.correct_count, 1);
    assert_eq!(summary.correct[0].display_answer, "ài");
}

#[test]
fn score_never_decreases() {
    let decks = three_card_decks();
    let mut session = Session::with_rng(StdRng::seed_from_u64(99));
    session.start(Difficulty::Medium, ToneMode::Toneless, &decks);

    let mut previous = session.score();
    for step in 0..80u32 {
        let answer = session.current_card().unwrap().answer.clone();
        match step % 3 {
            0 => session.submit_answer(&answer),
            1 => session.submit_answer("wrong"),
            _ => session.skip(),
        };
        assert!(session.score() >= previous);
        previous = session.score();

        assert_matches!(session.advance(), Advance::Next(_));
        session.tick();
        assert!(session.score() >= previous);
    }

    // 80 ticks of a 90 second budget
    assert_eq!(session.seconds_remaining(), 10);
    assert_eq!(session.correct_count(), 27);
    assert_eq!(session.wrong_count(), 27);
    assert_eq!(session.skipped_count(), 26);
}

#[test]
fn judging_is_idempotent_until_advance() {
    let decks = three_card_decks();
    let mut session = Session::with_rng(StdRng::seed_from_u64(3));
    session.start(Difficulty::Hard, ToneMode::Toned, &decks);

    let answer = session.current_card().unwrap().answer.clone();
    assert_eq!(session.submit_answer(&answer), Some(Outcome::Correct));
    let score = session.score();

    assert_eq!(session.submit_answer(&answer), None);
    assert_eq!(session.skip(), None);
    assert_eq!(session.score(), score);
    assert_eq!(session.correct_count(), 1);
    assert_eq!(session.log().len(), 1);
}

#[test]
fn unknown_tier_falls_back_to_easy() {
    let decks = three_card_decks();
    let mut session = Session::with_rng(StdRng::seed_from_u64(5));
    session.start_named("nightmare", "with tones", &decks);

    assert_eq!(session.difficulty(), Difficulty::Easy);
    assert_eq!(session.tone_mode(), ToneMode::Toned);
    assert_eq!(session.seconds_remaining(), 360);
}

#[test]
fn wrapping_reshuffles_and_keeps_every_card() {
    let decks = three_card_decks();
    let mut session = Session::with_rng(StdRng::seed_from_u64(11));
    session.start(Difficulty::Easy, ToneMode::Toned, &decks);

    let mut seen = Vec::new();
    for _ in 0..9 {
        seen.push(session.current_card().unwrap().prompt.clone());
        session.skip();
        session.advance();
    }

    assert_eq!(session.current_index(), 0);
    for chunk in seen.chunks(3) {
        let mut pass = chunk.to_vec();
        pass.sort();
        assert_eq!(pass, vec!["你", "八", "愛"]);
    }
}

#[test]
fn nothing_happens_after_the_clock_runs_out() {
    let decks = three_card_decks();
    let mut session = Session::with_rng(StdRng::seed_from_u64(13));
    session.start(Difficulty::Medium, ToneMode::Toneless, &decks);

    for _ in 0..90 {
        session.tick();
    }
    assert!(session.has_ended());

    assert_eq!(session.submit_answer("ba"), None);
    assert_eq!(session.skip(), None);
    assert_matches!(session.advance(), Advance::Ended);
    assert_eq!(session.tick(), Phase::Ended);
    assert_eq!(session.seconds_remaining(), 0);
    assert_eq!(session.summary().unwrap().answered(), 0);
}
