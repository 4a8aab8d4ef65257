use serde::{Deserialize, Serialize};

/// Difficulty tier: selects the deck, the time budget and the points per correct answer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// single characters
    #[default]
    Easy,
    /// two or three character words
    Medium,
    /// whole sentences
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Lenient parse. Anything that is not a known tier name is treated as easy.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    /// Countdown length in seconds.
    ///
    /// Easy gets the longest budget: the tier reflects answer length, not time pressure.
    pub fn time_budget_secs(&self) -> u32 {
        match self {
            Difficulty::Easy => 360,
            Difficulty::Medium => 90,
            Difficulty::Hard => 120,
        }
    }

    pub fn base_points(&self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
        }
    }

    /// Points for a correct answer given the seconds left on the clock
    pub fn points_for(&self, seconds_remaining: u32) -> u32 {
        self.base_points() + seconds_remaining / 10
    }
}

/// Whether answers are compared with or without tone marks
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToneMode {
    #[default]
    Toned,
    Toneless,
}

impl ToneMode {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "toneless" | "notone" | "no-tone" => ToneMode::Toneless,
            _ => ToneMode::Toned,
        }
    }

    pub fn from_toneless_flag(toneless: bool) -> Self {
        if toneless {
            ToneMode::Toneless
        } else {
            ToneMode::Toned
        }
    }

    /// Short label for status lines
    pub fn label(&self) -> &'static str {
        match self {
            ToneMode::Toned => "with tones",
            ToneMode::Toneless => "tone-less",
        }
    }
}
