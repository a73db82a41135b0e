pub mod analyze;
pub mod classify;
pub mod db;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod insights;
pub mod location;
pub mod pipeline;
pub mod record;
pub mod salary;
pub mod settings;
pub mod skills;
pub mod sync;
pub mod utils;

pub use classify::{Classifier, PatternConfig};
pub use pipeline::{clean_and_dedupe, clean_and_dedupe_with_report, CleanReport};
pub use record::{CleanRecord, RawRecord, CLEAN_COLUMNS};
