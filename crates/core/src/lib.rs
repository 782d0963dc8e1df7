pub mod config;
pub mod episode;
pub mod handler;
pub mod metrics;
pub mod probe;
pub mod quota;
pub mod release;
pub mod resolver;
pub mod testing;
pub mod tiers;

pub use config::{
    load_config, load_config_from_str, validate_config, ConfigError, PriorityConfig, QuotaConfig,
    ResolverConfig, SeasonPackConfig, TraversalConfig,
};
pub use episode::{classify_relevance, EpisodeInfo, EpisodeRelevance};
pub use handler::{CacheHandler, HandlerCapabilities, HandlerError, SeasonPackHint};
pub use probe::{ProbeStats, ResultRecord, VerificationSource};
pub use quota::{
    CodecCaps, LedgerSnapshot, QuotaLedger, QuotaLimits, Rejection, ResolutionCaps,
    SatisfiedQuotas,
};
pub use release::{
    normalize_all, normalize_release, CandidateRelease, Classifier, Codec, DefaultClassifier,
    NormalizedRelease, QualityCategory, Resolution,
};
pub use resolver::{
    resolve_cached_releases, CacheResolver, Phase, PhaseReport, PhaseStatus, ResolveOutcome,
    ResolveRequest, StopReason,
};
pub use tiers::{SortPolicy, TierGroups, TierName, TraversalMode};
