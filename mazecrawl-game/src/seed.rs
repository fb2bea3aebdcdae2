//! Seed plumbing: per-domain RNG streams and reversible share codes.
//!
//! Share code format: `<TIER>-<WORD><NN>`, e.g. `EZ-LANTERN42`, `HD-MINOTAUR07`.
//! The word index and the two digits are packed into the low bits of the
//! seed, so decoding a code and re-encoding its seed yields the same code.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::difficulty::Difficulty;

/// Derive an independent stream seed from a user seed and a domain label.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        // HMAC accepts keys of any length.
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// RNG streams for one session, segregated so that changing how many draws
/// placement makes never perturbs the maze layout.
#[derive(Debug, Clone)]
pub struct SeedStreams {
    maze: ChaCha20Rng,
    placement: ChaCha20Rng,
}

impl SeedStreams {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            maze: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"maze")),
            placement: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"placement")),
        }
    }

    /// Stream driving maze carving and loop injection.
    pub const fn maze(&mut self) -> &mut ChaCha20Rng {
        &mut self.maze
    }

    /// Stream driving collectible placement.
    pub const fn placement(&mut self) -> &mut ChaCha20Rng {
        &mut self.placement
    }
}

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "LANTERN", "CORRIDOR", "MINOTAUR", "THREAD", "TORCH", "GEM", "CRYPT", "ARCH", "PILLAR",
    "STAIR", "VAULT", "HEDGE", "LABYRINTH", "COMPASS", "NORTH", "SOUTH", "EAST", "WEST", "CHALK",
    "MARKER", "SHADOW", "ECHO", "RUNE", "SCROLL", "RELIC", "BRICK", "MORTAR", "GRANITE", "MOSS",
    "IVY", "TUNNEL", "PASSAGE", "ALCOVE", "CHAMBER", "GATE", "KEY", "LEVER", "TRAP", "MAP",
    "FOG", "EMBER", "CANDLE", "BEACON", "SPIRAL", "WINDING", "DEADEND", "JUNCTION", "LOOP",
    "BRANCH", "ROOT", "CAVERN", "GROTTO", "DUNGEON", "TOWER", "KEEP", "MOAT", "BRIDGE", "RIDDLE",
    "SPHINX", "QUEST", "WANDER", "ROAM", "SEEKER", "FINDER",
];

const _: () = assert!(WORD_LIST.len().is_power_of_two());

/// Low bits of a code-derived seed holding the word index.
const WORD_INDEX_BITS: u32 = WORD_LIST.len().trailing_zeros();
const WORD_INDEX_MASK: u64 = (1 << WORD_INDEX_BITS) - 1;
/// Bits above the word index holding the two-digit suffix (0..=99).
const SUFFIX_BITS: u32 = 7;
const SUFFIX_MASK: u64 = (1 << SUFFIX_BITS) - 1;
const PAYLOAD_BITS: u32 = WORD_INDEX_BITS + SUFFIX_BITS;

fn pack(word_index: usize, suffix: u8) -> u64 {
    let word = u64::try_from(word_index).unwrap_or(0) & WORD_INDEX_MASK;
    word | ((u64::from(suffix) & SUFFIX_MASK) << WORD_INDEX_BITS)
}

fn unpack(seed: u64) -> (usize, u8) {
    let word_index = usize::try_from(seed & WORD_INDEX_MASK).unwrap_or(0);
    let suffix = u8::try_from((seed >> WORD_INDEX_BITS) & SUFFIX_MASK).unwrap_or(0);
    (word_index, suffix)
}

/// Seed for a code: tier-keyed hash bits above the packed word and suffix.
fn compose_seed(difficulty: Difficulty, word_index: usize, suffix: u8) -> u64 {
    let payload = pack(word_index, suffix);
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(difficulty.code_prefix().as_bytes());
    hasher.write_u64(payload);
    (hasher.finish() << PAYLOAD_BITS) | payload
}

/// Render a seed as a share code for the given tier.
#[must_use]
pub fn encode_friendly(difficulty: Difficulty, seed: u64) -> String {
    let (word_index, suffix) = unpack(seed);
    let word = WORD_LIST[word_index];
    format!("{}-{word}{:02}", difficulty.code_prefix(), suffix % 100)
}

/// Parse a share code back into its tier and seed.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(Difficulty, u64)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let difficulty = Difficulty::from_code_prefix(prefix)?;
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, suffix_part) = rest.split_at(rest.len() - 2);
    if !suffix_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let suffix: u8 = suffix_part.parse().ok()?;
    let word_index = WORD_LIST
        .iter()
        .position(|w| w.eq_ignore_ascii_case(word_part))?;
    Some((difficulty, compose_seed(difficulty, word_index, suffix)))
}

/// Mint a fresh share code from arbitrary entropy.
#[must_use]
pub fn generate_code_from_entropy(difficulty: Difficulty, entropy: u64) -> String {
    let word_index = usize::try_from(entropy & WORD_INDEX_MASK).unwrap_or(0);
    let suffix = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_friendly(difficulty, compose_seed(difficulty, word_index, suffix))
}
