pub mod types;
pub mod normalizer;
pub mod verdict;
pub mod exclusion;
pub mod tiering;
pub mod traits;
pub mod builder;
pub mod store;
pub mod notify;
pub mod settings;
pub mod config;

pub use types::*;
pub use builder::{DigestBuilder, GenerateOutcome, GenerateStatus};
pub use exclusion::ExclusionRule;
pub use normalizer::{canonicalize_url, normalize_candidate};
pub use tiering::{tier, TierPolicy};
pub use traits::{DigestStore, ItemSink, Notifier, PoolProvider, SettingsStore};
pub use store::{MemoryStore, PgStore};
pub use config::AppConfig;
