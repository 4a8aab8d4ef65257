use log::{debug, info};
use rand::rngs::ThreadRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::answer::answers_match;
use crate::deck::{build_deck, shuffle, Card, DeckSource};
use crate::difficulty::{Difficulty, ToneMode};

/// Lifecycle of a drill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

/// Per-card state inside a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Unanswered,
    Judged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub card: Card,
    pub outcome: Outcome,
}

/// Result of moving to the next card
#[derive(Debug, PartialEq, Eq)]
pub enum Advance<'a> {
    Next(&'a Card),
    Ended,
}

/// Final numbers of an ended session, with the log split by outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub difficulty: Difficulty,
    pub tone_mode: ToneMode,
    pub score: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub skipped_count: u32,
    pub correct: Vec<Card>,
    pub wrong: Vec<Card>,
    pub skipped: Vec<Card>,
    /// Every judgement in the order it happened
    pub log: Vec<LogEntry>,
}

impl SessionSummary {
    pub fn answered(&self) -> u32 {
        self.correct_count + self.wrong_count + self.skipped_count
    }

    /// Percentage of judged cards that were correct, rounded
    pub fn accuracy(&self) -> f64 {
        match self.answered() {
            0 => 0.0,
            n => ((self.correct_count as f64 / n as f64) * 100.0).round(),
        }
    }
}

/// A timed pinyin drill.
///
/// The session never schedules anything on its own: the owner calls [`Session::tick`] once per
/// second and re-reads state after every operation. Calls that do not fit the current phase or
/// card state are ignored rather than rejected.
#[derive(Debug)]
pub struct Session<R: Rng = ThreadRng> {
    rng: R,
    phase: Phase,
    card_state: CardState,
    difficulty: Difficulty,
    tone_mode: ToneMode,
    deck: Vec<Card>,
    current_index: usize,
    seconds_remaining: u32,
    score: u32,
    correct_count: u32,
    wrong_count: u32,
    skipped_count: u32,
    log: Vec<LogEntry>,
}

impl Session<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for Session<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Session<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            phase: Phase::Idle,
            card_state: CardState::Unanswered,
            difficulty: Difficulty::default(),
            tone_mode: ToneMode::default(),
            deck: vec![],
            current_index: 0,
            seconds_remaining: 0,
            score: 0,
            correct_count: 0,
            wrong_count: 0,
            skipped_count: 0,
            log: vec![],
        }
    }

    /// Begin (or restart) a drill. Any previous state is discarded.
    pub fn start(&mut self, difficulty: Difficulty, tone_mode: ToneMode, source: &dyn DeckSource) {
        self.difficulty = difficulty;
        self.tone_mode = tone_mode;
        self.deck = build_deck(source, difficulty, tone_mode);
        shuffle(&mut self.deck, &mut self.rng);

        self.current_index = 0;
        self.card_state = CardState::Unanswered;
        self.seconds_remaining = difficulty.time_budget_secs();
        self.score = 0;
        self.correct_count = 0;
        self.wrong_count = 0;
        self.skipped_count = 0;
        self.log.clear();
        self.phase = Phase::Running;

        info!(
            "session started: {} / {} / {} cards / {}s",
            difficulty,
            tone_mode,
            self.deck.len(),
            self.seconds_remaining
        );
    }

    /// Same as [`Session::start`] but takes tier and mode by name, defaulting unknown names
    pub fn start_named(&mut self, difficulty: &str, tone_mode: &str, source: &dyn DeckSource) {
        self.start(
            Difficulty::from_name(difficulty),
            ToneMode::from_name(tone_mode),
            source,
        )
    }

    pub fn current_card(&self) -> Option<&Card> {
        match self.phase {
            Phase::Idle => None,
            _ => self.deck.get(self.current_index),
        }
    }

    fn accepts_judgement(&self) -> bool {
        self.phase == Phase::Running
            && self.card_state == CardState::Unanswered
            && self.current_index < self.deck.len()
    }

    fn record(&mut self, outcome: Outcome) {
        let card = self.deck[self.current_index].clone();
        debug!("{} -> {}", card.prompt, outcome);
        self.log.push(LogEntry { card, outcome });
        self.card_state = CardState::Judged;
    }

    /// Judge typed input against the current card. `None` when the call is ignored.
    pub fn submit_answer(&mut self, input: &str) -> Option<Outcome> {
        if !self.accepts_judgement() {
            return None;
        }

        let outcome = if answers_match(input, &self.deck[self.current_index].answer) {
            self.score += self.difficulty.points_for(self.seconds_remaining);
            self.correct_count += 1;
            Outcome::Correct
        } else {
            self.wrong_count += 1;
            Outcome::Wrong
        };

        self.record(outcome);
        Some(outcome)
    }

    /// Give up on the current card. `None` when the call is ignored.
    pub fn skip(&mut self) -> Option<Outcome> {
        if !self.accepts_judgement() {
            return None;
        }

        self.skipped_count += 1;
        self.record(Outcome::Skipped);
        Some(Outcome::Skipped)
    }

    /// Move past a judged card. Past the end of the deck the order is reshuffled and the
    /// index wraps to zero. An unjudged card stays put.
    pub fn advance(&mut self) -> Advance<'_> {
        if self.phase != Phase::Running || self.deck.is_empty() {
            return Advance::Ended;
        }

        if self.card_state == CardState::Judged {
            self.current_index += 1;
            if self.current_index >= self.deck.len() {
                shuffle(&mut self.deck, &mut self.rng);
                self.current_index = 0;
            }
            self.card_state = CardState::Unanswered;
        }

        Advance::Next(&self.deck[self.current_index])
    }

    /// One second of the countdown. Returns the phase after the tick.
    pub fn tick(&mut self) -> Phase {
        if self.phase == Phase::Running {
            self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
            if self.seconds_remaining == 0 {
                self.phase = Phase::Ended;
                info!(
                    "session ended: score {} ({} correct, {} wrong, {} skipped)",
                    self.score, self.correct_count, self.wrong_count, self.skipped_count
                );
            }
        }
        self.phase
    }

    /// Available only once the countdown has run out
    pub fn summary(&self) -> Option<SessionSummary> {
        if self.phase != Phase::Ended {
            return None;
        }

        let by_outcome = |outcome: Outcome| -> Vec<Card> {
            self.log
                .iter()
                .filter(|e| e.outcome == outcome)
                .map(|e| e.card.clone())
                .collect()
        };

        Some(SessionSummary {
            difficulty: self.difficulty,
            tone_mode: self.tone_mode,
            score: self.score,
            correct_count: self.correct_count,
            wrong_count: self.wrong_count,
            skipped_count: self.skipped_count,
            correct: by_outcome(Outcome::Correct),
            wrong: by_outcome(Outcome::Wrong),
            skipped: by_outcome(Outcome::Skipped),
            log: self.log.clone(),
        })
    }

    /// A nudge for the current card: the first letter on easy, the first syllable otherwise
    pub fn hint(&self) -> Option<String> {
        if self.phase != Phase::Running {
            return None;
        }
        let answer = &self.current_card()?.answer;

        match self.difficulty {
            Difficulty::Easy => answer.chars().next().map(String::from),
            _ => answer
                .split(' ')
                .next()
                .filter(|w| !w.is_empty())
                .map(|w| format!("{w} ")),
        }
    }

    /// 1-based position in the deck and the deck size
    pub fn progress(&self) -> (usize, usize) {
        if self.deck.is_empty() {
            (0, 0)
        } else {
            (self.current_index + 1, self.deck.len())
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn card_state(&self) -> CardState {
        self.card_state
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn has_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn tone_mode(&self) -> ToneMode {
        self.tone_mode
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn skipped_count(&self) -> u32 {
        self.skipped_count
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Outcome recorded for the current card, if it has been judged
    pub fn last_outcome(&self) -> Option<Outcome> {
        match self.card_state {
            CardState::Judged => self.log.last().map(|e| e.outcome),
            CardState::Unanswered => None,
        }
    }
}
