use serde::{Deserialize, Serialize};

/// The three phases a campaign can run; also doubles as the job type a
/// queued job is dispatched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    Generation,
    DnsValidation,
    HttpKeyword,
}

/// Campaign lifecycle state. See `domainflow-orchestrator` for the legal
/// edge set between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl CampaignStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Failed | CampaignStatus::Cancelled)
    }
}

/// Shape of the variable portion of a generation campaign's domain space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    PrefixVariable,
    SuffixVariable,
    BothVariable,
    ConstantOnly,
}

/// Outcome of resolving one domain under a DNS persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DnsValidationStatus {
    Resolved,
    Unresolved,
    Error,
    Pending,
    Skipped,
}

/// Outcome of fetching and scanning one domain over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HttpValidationStatus {
    Success,
    /// Reserved: no classifier path populates this yet (spec Open Question 2).
    ContentMismatch,
    KeywordsNotFound,
    Unreachable,
    AccessDenied,
    ProxyError,
    DnsError,
    Timeout,
    Error,
    Pending,
    Skipped,
}

/// What a persona is configured to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PersonaType {
    Dns,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProxySelectionStrategy {
    RoundRobin,
    Random,
    LeastUsed,
}

/// Persona rotation strategy (§4.3). Not persisted — a campaign's persona
/// assignment is just an ordered id list; rotation strategy is a pure
/// in-process selection concern for the worker handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaSelectionStrategy {
    RoundRobin,
}

/// How a keyword set rule's `pattern` is matched against extracted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Literal,
    Regex,
    Substring,
}

/// What an HTTP keyword campaign draws its input domains from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    DomainGeneration,
    DnsValidation,
}

/// Job queue lifecycle state (§4.5). Distinct from `CampaignStatus`: a job
/// can be `retry` while its owning campaign is still `running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Retry,
}
