pub mod scenario;
pub mod util;

pub use util::{load_presets, parse_difficulties, split_csv};
