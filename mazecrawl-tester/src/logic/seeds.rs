use anyhow::{Context, Result, bail};
use mazecrawl_game::{Difficulty, decode_to_seed, encode_friendly};
use std::collections::HashMap;

/// Detailed seed metadata used for logic and playability analysis.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_difficulty: Option<Difficulty>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_difficulty: None,
        }
    }

    #[must_use]
    pub const fn from_share_code(seed: u64, difficulty: Difficulty, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_difficulty: Some(difficulty),
        }
    }

    /// Share codes pin a tier; plain numbers run on every tier.
    #[must_use]
    pub fn matches_difficulty(&self, difficulty: Difficulty) -> bool {
        self.source_difficulty
            .is_none_or(|source| source == difficulty)
    }

    #[must_use]
    pub fn share_code_for(&self, difficulty: Difficulty) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_difficulty)
            && source == difficulty
        {
            return code.clone();
        }

        encode_friendly(difficulty, self.seed)
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, share codes, and the special keywords
/// `all` / `available` which expand to every share-code seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case("available") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some((difficulty, seed)) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(
                seed,
                difficulty,
                token.to_uppercase(),
            ));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(generate_all_share_code_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, u8), usize> = HashMap::new();

    for info in pending {
        let key = (info.seed, difficulty_tag(info.source_difficulty));
        if let Some(&existing) = index.get(&key) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

fn generate_all_share_code_seeds() -> Result<Vec<SeedInfo>> {
    use mazecrawl_game::seed::WORD_LIST;

    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100 * Difficulty::ALL.len());

    for word in WORD_LIST {
        for suffix in 0..100 {
            for difficulty in Difficulty::ALL {
                let code = format!("{}-{word}{suffix:02}", difficulty.code_prefix());
                let (difficulty, seed) = decode_to_seed(&code)
                    .with_context(|| format!("failed to parse share code: {code}"))?;
                seeds.push(SeedInfo::from_share_code(seed, difficulty, code));
            }
        }
    }

    Ok(seeds)
}

const fn difficulty_tag(difficulty: Option<Difficulty>) -> u8 {
    match difficulty {
        Some(Difficulty::Easy) => 1,
        Some(Difficulty::Normal) => 2,
        Some(Difficulty::Hard) => 3,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_numeric_and_share_code() {
        let raw = vec![
            "42".to_string(),
            "-7".to_string(),
            "ez-lantern42".to_string(),
        ];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert!(seeds.iter().any(|s| s.seed == 42 && s.code.is_none()));
        assert!(seeds.iter().any(|s| s.seed == 7 && s.code.is_none()));
        assert!(seeds.iter().any(|s| {
            s.code.as_deref() == Some("EZ-LANTERN42")
                && s.source_difficulty == Some(Difficulty::Easy)
        }));
    }

    #[test]
    fn rejects_garbage_tokens() {
        let err = resolve_seed_inputs(&["not-a-seed".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not-a-seed"));
    }

    #[test]
    fn empty_input_defaults_to_1337() {
        let seeds = resolve_seed_inputs(&[String::new()]).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].seed, 1337);
    }

    #[test]
    fn duplicates_prefer_the_share_code_entry() {
        let (_, seed) = decode_to_seed("NM-MINOTAUR07").unwrap();
        let raw = vec![seed.to_string(), seed.to_string()];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert_eq!(seeds.len(), 1);

        let raw = vec!["NM-MINOTAUR07".to_string(), "nm-minotaur07".to_string()];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert_eq!(seeds.len(), 1);
        assert!(seeds[0].matches_difficulty(Difficulty::Normal));
        assert!(!seeds[0].matches_difficulty(Difficulty::Hard));
        assert_eq!(seeds[0].share_code_for(Difficulty::Normal), "NM-MINOTAUR07");
    }

    #[test]
    fn expands_all_share_codes() {
        let seeds = resolve_seed_inputs(&["all".to_string()]).unwrap();
        let expected = mazecrawl_game::seed::WORD_LIST.len() * 100 * Difficulty::ALL.len();
        assert_eq!(seeds.len(), expected);
        assert!(seeds.iter().all(|s| s.code.is_some()));
    }
}
