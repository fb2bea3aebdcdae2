//! Difficulty tiers and their maze presets.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MazeError;
use crate::maze::validate_dimensions;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Hard];

    /// Tag used for display and as the best-time storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    /// Two-letter prefix used in share codes.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::Easy => "EZ",
            Self::Normal => "NM",
            Self::Hard => "HD",
        }
    }

    #[must_use]
    pub fn from_code_prefix(prefix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.code_prefix().eq_ignore_ascii_case(prefix))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            _ => Err(()),
        }
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.as_str().to_string()
    }
}

/// Maze size and collectible count for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyPreset {
    pub width: usize,
    pub height: usize,
    pub collectible_count: usize,
}

impl DifficultyPreset {
    #[must_use]
    pub const fn new(width: usize, height: usize, collectible_count: usize) -> Self {
        Self {
            width,
            height,
            collectible_count,
        }
    }

    /// Validate the preset dimensions and collectible room.
    ///
    /// # Errors
    ///
    /// Returns `MazeError::InvalidDimensions` for rejected sizes and
    /// `MazeError::InvalidPreset` when the count cannot fit even in the
    /// rooms a perfect maze always opens.
    pub fn validate(&self) -> Result<(), MazeError> {
        validate_dimensions(self.width, self.height)?;
        let rooms = (self.width / 2) * (self.height / 2);
        let guaranteed = rooms.saturating_sub(2);
        if self.collectible_count > guaranteed {
            return Err(MazeError::InvalidPreset {
                reason: format!(
                    "{} collectibles exceed the {guaranteed} guaranteed free cells of a {}x{} maze",
                    self.collectible_count, self.width, self.height
                ),
            });
        }
        Ok(())
    }
}

/// Presets for every tier. Missing tiers in JSON fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    pub easy: DifficultyPreset,
    pub normal: DifficultyPreset,
    pub hard: DifficultyPreset,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: DifficultyPreset::new(15, 11, 2),
            normal: DifficultyPreset::new(31, 21, 3),
            hard: DifficultyPreset::new(51, 31, 5),
        }
    }
}

impl DifficultyTable {
    #[must_use]
    pub const fn preset(&self, difficulty: Difficulty) -> DifficultyPreset {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }

    /// Parse and validate a preset table from JSON.
    ///
    /// # Errors
    ///
    /// Returns `MazeError::InvalidPreset` when the JSON is malformed and the
    /// errors of [`DifficultyTable::validate`] otherwise.
    pub fn from_json(json: &str) -> Result<Self, MazeError> {
        let table: Self = serde_json::from_str(json).map_err(|err| MazeError::InvalidPreset {
            reason: err.to_string(),
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Validate every preset.
    ///
    /// # Errors
    ///
    /// Returns the first preset failure encountered, easiest tier first.
    pub fn validate(&self) -> Result<(), MazeError> {
        for tier in Difficulty::ALL {
            self.preset(tier).validate()?;
        }
        Ok(())
    }
}
