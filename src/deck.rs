use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::answer::strip_tone_marks;
use crate::difficulty::{Difficulty, ToneMode};

static DECK_DIR: Dir = include_dir!("src/decks");

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("deck file {0} not found")]
    NotFound(String),

    #[error("deck file {0} is not valid utf-8")]
    NotUtf8(String),

    #[error("built-in deck {file} is labelled {found}, expected {expected}")]
    TierMismatch {
        file: String,
        expected: Difficulty,
        found: Difficulty,
    },

    #[error("unable to read deck file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse deck json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} tier has no cards")]
    EmptyTier(Difficulty),

    #[error("{tier} card #{index} has a blank prompt or answer")]
    BlankEntry { tier: Difficulty, index: usize },
}

/// One line of deck data as it is stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub prompt: String,
    /// Pinyin with tone marks
    pub answer: String,
    /// Pinyin without tone marks. Derived from `answer` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toneless: Option<String>,
}

impl DeckEntry {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
            toneless: None,
        }
    }

    pub fn with_toneless(mut self, toneless: impl Into<String>) -> Self {
        self.toneless = Some(toneless.into());
        self
    }

    pub fn toneless_answer(&self) -> String {
        self.toneless
            .clone()
            .unwrap_or_else(|| strip_tone_marks(&self.answer))
    }
}

/// A quiz unit as presented during a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub prompt: String,
    /// What typed input is compared against
    pub answer: String,
    /// What the learner is shown after judgement
    pub display_answer: String,
}

impl Card {
    pub fn from_entry(entry: &DeckEntry, tone_mode: ToneMode) -> Self {
        let answer = match tone_mode {
            ToneMode::Toned => entry.answer.clone(),
            ToneMode::Toneless => entry.toneless_answer(),
        };
        Self {
            prompt: entry.prompt.clone(),
            answer,
            display_answer: entry.answer.clone(),
        }
    }

    /// True when the display form carries information the comparison form lacks
    pub fn has_distinct_display(&self) -> bool {
        self.answer != self.display_answer
    }
}

/// Anything that can hand out the ordered entries of a tier
pub trait DeckSource {
    fn entries(&self, difficulty: Difficulty) -> &[DeckEntry];
}

/// Entries for all three tiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSet {
    pub easy: Vec<DeckEntry>,
    pub medium: Vec<DeckEntry>,
    pub hard: Vec<DeckEntry>,
}

#[derive(Deserialize)]
struct BuiltinDeckFile {
    tier: Difficulty,
    cards: Vec<DeckEntry>,
}

impl DeckSet {
    /// The decks compiled into the binary
    pub fn builtin() -> Result<Self, DeckError> {
        Ok(Self {
            easy: read_builtin_deck(Difficulty::Easy)?,
            medium: read_builtin_deck(Difficulty::Medium)?,
            hard: read_builtin_deck(Difficulty::Hard)?,
        })
    }

    /// Load a custom deck file shaped like `{"easy": [...], "medium": [...], "hard": [...]}`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DeckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DeckError> {
        let set: DeckSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        for tier in Difficulty::ALL {
            let entries = self.entries(tier);
            if entries.is_empty() {
                return Err(DeckError::EmptyTier(tier));
            }
            if let Some(index) = entries
                .iter()
                .position(|e| e.prompt.trim().is_empty() || e.answer.trim().is_empty())
            {
                return Err(DeckError::BlankEntry { tier, index });
            }
        }
        Ok(())
    }
}

impl DeckSource for DeckSet {
    fn entries(&self, difficulty: Difficulty) -> &[DeckEntry] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

fn read_builtin_deck(tier: Difficulty) -> Result<Vec<DeckEntry>, DeckError> {
    let file_name = format!("{tier}.json");
    let file = DECK_DIR
        .get_file(&file_name)
        .ok_or_else(|| DeckError::NotFound(file_name.clone()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| DeckError::NotUtf8(file_name.clone()))?;

    parse_builtin_deck(&file_name, contents, tier)
}

/// A built-in deck file must hold the tier its name promises
fn parse_builtin_deck(
    file_name: &str,
    contents: &str,
    expected: Difficulty,
) -> Result<Vec<DeckEntry>, DeckError> {
    let deck: BuiltinDeckFile = serde_json::from_str(contents)?;
    if deck.tier != expected {
        return Err(DeckError::TierMismatch {
            file: file_name.to_string(),
            expected,
            found: deck.tier,
        });
    }
    Ok(deck.cards)
}

/// Cards for a tier with the tone-mode transform applied, in source order
pub fn build_deck(source: &dyn DeckSource, difficulty: Difficulty, tone_mode: ToneMode) -> Vec<Card> {
    source
        .entries(difficulty)
        .iter()
        .map(|entry| Card::from_entry(entry, tone_mode))
        .collect()
}

/// In-place Fisher-Yates: walk from the back, swapping each slot with a uniform pick from the
/// unshuffled prefix including itself.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
