//! Shared identifiers, error taxonomy, domain enums, and pagination types
//! used across every DomainFlow crate.

pub mod error;
pub mod model;
pub mod pagination;

pub use error::{Error, ErrorKind, Result};
pub use model::{
    CampaignStatus, CampaignType, DnsValidationStatus, HttpValidationStatus, JobStatus,
    PatternType, PersonaSelectionStrategy, PersonaType, ProxyProtocol, ProxySelectionStrategy,
    RuleType, SourceType,
};
pub use pagination::{Cursor, Page};

/// Every entity id in this workspace is a `Uuid` — there is a single id
/// space, not a per-entity wrapper type, matching how the teacher's own
/// models key everything off `Uuid` directly.
pub type Id = uuid::Uuid;

/// Application timestamps are always UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
