use anyhow::{Context, Result, bail};
use mazecrawl_game::{Difficulty, DifficultyTable};
use std::{fs, path::Path};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse `--difficulties`; `all` selects every tier.
pub fn parse_difficulties(s: &str) -> Result<Vec<Difficulty>> {
    let mut tiers = Vec::new();
    for token in split_csv(s) {
        if token.eq_ignore_ascii_case("all") {
            return Ok(Difficulty::ALL.to_vec());
        }
        let Ok(tier) = token.parse::<Difficulty>() else {
            bail!("Unknown difficulty: {token}");
        };
        if !tiers.contains(&tier) {
            tiers.push(tier);
        }
    }
    if tiers.is_empty() {
        bail!("No difficulty selected");
    }
    Ok(tiers)
}

/// Read a preset override table, or the built-in presets when no path is
/// given.
pub fn load_presets(path: Option<&Path>) -> Result<DifficultyTable> {
    let Some(path) = path else {
        return Ok(DifficultyTable::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read presets from {}", path.display()))?;
    DifficultyTable::from_json(&raw)
        .with_context(|| format!("invalid presets in {}", path.display()))
}
