use serde::{Deserialize, Serialize};

/// Display color of an option.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorId {
    Red,
    Yellow,
    Blue,
    Green,
    Purple,
    Pink,
}

/// The word printed on an option. Each word names exactly one color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum WordId {
    Red,
    Yellow,
    Blue,
    Green,
    Purple,
    Pink,
}

impl ColorId {
    pub const ALL: [ColorId; 6] = [
        ColorId::Red,
        ColorId::Yellow,
        ColorId::Blue,
        ColorId::Green,
        ColorId::Purple,
        ColorId::Pink,
    ];
}

impl WordId {
    pub const ALL: [WordId; 6] = [
        WordId::Red,
        WordId::Yellow,
        WordId::Blue,
        WordId::Green,
        WordId::Purple,
        WordId::Pink,
    ];

    /// Label as shown on an option button
    pub fn label(&self) -> String {
        self.to_string()
    }
}

/// The color a word means, independent of the ink it is printed in.
pub fn canonical_color_of(word: WordId) -> ColorId {
    match word {
        WordId::Red => ColorId::Red,
        WordId::Yellow => ColorId::Yellow,
        WordId::Blue => ColorId::Blue,
        WordId::Green => ColorId::Green,
        WordId::Purple => ColorId::Purple,
        WordId::Pink => ColorId::Pink,
    }
}

/// True when the ink agrees with the word's meaning ("RED" printed in red).
pub fn word_matches_color(word: WordId, color: ColorId) -> bool {
    canonical_color_of(word) == color
}
