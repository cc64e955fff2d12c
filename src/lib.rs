// Donor Network - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;     // Engine configuration (TOML)
pub mod error;      // Error types
pub mod normalizer; // Name keys and comparison views
pub mod matcher;    // Tiered fuzzy name matching
pub mod records;    // CSV boundary
pub mod resolver;   // Contributor ↔ beneficiary resolution
pub mod weights;    // Edge widths, node sizes, labels
pub mod layout;     // Deterministic placement
pub mod graph;      // Snapshot assembly
pub mod sources;    // Table locations and fresh loads

// Re-export commonly used types
pub use config::{
    EngineConfig, LabelConfig, LayoutConfig, MatchingConfig, Palette, TieBreak, WeightConfig,
};
pub use error::{Error, Result, RowError};
pub use normalizer::{fold_abbreviations, normalize, strip_org_suffixes, DEFAULT_ORG_SUFFIXES};
pub use matcher::{FuzzyMatcher, MatchTier, NameMatch};
pub use records::{
    load_beneficiaries_csv, load_contributions_csv, parse_amount, parse_date,
    BeneficiaryRecord, ContributorRecord, LedgerKind, LoadReport,
};
pub use resolver::{
    Category, EntityKind, Relationship, RelationshipResolver, Resolution, ResolvedEntity,
};
pub use weights::{edge_label, latest_contribution, AmountTier, EdgeWeight, WeightCalculator};
pub use layout::{LayoutEngine, Placement, Region};
pub use graph::{GraphAssembler, GraphEdge, GraphNode, GraphSnapshot, GraphSummary};
pub use sources::{snapshot_from_sources, LoadedTables, TableSources};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
