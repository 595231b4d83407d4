use domainflow_core::{Error, PersonaSelectionStrategy, PersonaType, Result};
use domainflow_storage::models::Persona;
use domainflow_storage::PersonaRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// DNS persona config shape validated on write (§4.3): resolver list and
/// per-domain retry count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsPersonaConfig {
    pub resolvers: Vec<String>,
    #[serde(default = "default_retry")]
    pub retry_attempts: u32,
}

/// HTTP persona config shape: headers, TLS options, timeouts, redirect
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpPersonaConfig {
    pub user_agent: String,
    #[serde(default)]
    pub headers: std::collections::BTreeMap<String, String>,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub follow_redirects: bool,
    #[serde(default = "default_redirect_depth")]
    pub max_redirect_depth: u32,
    #[serde(default)]
    pub tls_insecure_skip_verify: bool,
}

fn default_retry() -> u32 {
    3
}

fn default_redirect_depth() -> u32 {
    5
}

/// Validate a persona's `config_details` against its type-specific schema
/// (§4.3): DNS needs at least one resolver address; HTTP needs a
/// non-empty user-agent and a positive timeout.
pub fn validate_config(persona_type: PersonaType, config_details: &serde_json::Value) -> Result<()> {
    match persona_type {
        PersonaType::Dns => {
            let config: DnsPersonaConfig = serde_json::from_value(config_details.clone())
                .map_err(|e| Error::validation(format!("invalid dns persona config: {e}")))?;
            if config.resolvers.is_empty() {
                return Err(Error::validation("dns persona requires at least one resolver address"));
            }
        }
        PersonaType::Http => {
            let config: HttpPersonaConfig = serde_json::from_value(config_details.clone())
                .map_err(|e| Error::validation(format!("invalid http persona config: {e}")))?;
            if config.user_agent.trim().is_empty() {
                return Err(Error::validation("http persona requires a non-empty user-agent"));
            }
            if config.timeout_seconds == 0 {
                return Err(Error::validation("http persona requires a positive timeout"));
            }
        }
    }
    Ok(())
}

/// CRUD plus rotation over personas.
pub struct PersonaRegistry {
    repo: Arc<PersonaRepository>,
}

impl PersonaRegistry {
    pub fn new(repo: Arc<PersonaRepository>) -> Self {
        PersonaRegistry { repo }
    }

    pub async fn create(
        &self,
        name: &str,
        persona_type: PersonaType,
        config_details: serde_json::Value,
    ) -> Result<Persona> {
        validate_config(persona_type, &config_details)?;
        self.repo.create(name, persona_type, config_details).await
    }

    pub async fn get_active(&self, persona_type: PersonaType) -> Result<Vec<Persona>> {
        self.repo.get_active(persona_type).await
    }

    /// Rotation helper (§4.3): `select(personas, strategy, tick_counter)`
    /// returns the next persona under `strategy`. `tick_counter` must
    /// already be gated on elapsed time against `rotation_interval_seconds`
    /// by the caller — advancing it once per domain processed would rotate
    /// far faster than configured. `RoundRobin` is the only strategy today;
    /// the parameter exists so a future strategy doesn't change this
    /// signature.
    pub fn select(personas: &[Persona], strategy: PersonaSelectionStrategy, tick_counter: u64) -> Option<&Persona> {
        if personas.is_empty() {
            return None;
        }
        match strategy {
            PersonaSelectionStrategy::RoundRobin => {
                let index = (tick_counter as usize) % personas.len();
                personas.get(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_config_requires_resolver() {
        let config = serde_json::json!({"resolvers": []});
        let err = validate_config(PersonaType::Dns, &config).unwrap_err();
        assert_eq!(err.kind(), domainflow_core::ErrorKind::Validation);
    }

    #[test]
    fn http_config_requires_user_agent_and_timeout() {
        let config = serde_json::json!({"user_agent": "", "timeout_seconds": 5});
        assert!(validate_config(PersonaType::Http, &config).is_err());

        let config = serde_json::json!({"user_agent": "DomainFlow/1.0", "timeout_seconds": 0});
        assert!(validate_config(PersonaType::Http, &config).is_err());

        let config = serde_json::json!({"user_agent": "DomainFlow/1.0", "timeout_seconds": 10});
        assert!(validate_config(PersonaType::Http, &config).is_ok());
    }

    #[test]
    fn select_rotates_through_personas() {
        let personas = vec![];
        assert!(PersonaRegistry::select(&personas, PersonaSelectionStrategy::RoundRobin, 0).is_none());
    }
}
