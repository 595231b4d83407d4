use crate::requests::{CreateDnsValidationRequest, CreateGenerationRequest, CreateHttpKeywordRequest};
use domainflow_core::{CampaignType, Error, PatternType, PersonaType, Result, SourceType};
use domainflow_generator::{total_possible_combinations, GenerationParams};
use domainflow_storage::Store;

/// Result of validating a generation request: the request plus the
/// derived `total_possible_combinations`, since the caller never supplies
/// it directly (§4.9).
pub struct ValidatedGeneration {
    pub request: CreateGenerationRequest,
    pub total_possible_combinations: i64,
}

/// Generation rules (§4.9): character_set non-empty, variable_length ≥1
/// when the pattern requires a variable portion, total combinations ≥
/// num_domains_to_generate, no 64-bit overflow. The overflow and
/// empty-charset checks are delegated to the generator itself so there is
/// one source of truth for the arithmetic.
pub fn validate_generation(request: CreateGenerationRequest) -> Result<ValidatedGeneration> {
    if request.num_domains_to_generate <= 0 {
        return Err(Error::validation("num_domains_to_generate must be positive"));
    }
    if request.pattern_type != PatternType::ConstantOnly && request.variable_length < 1 {
        return Err(Error::validation("variable_length must be at least 1 for a variable pattern"));
    }
    let params = GenerationParams {
        pattern_type: request.pattern_type,
        variable_length: request.variable_length.max(0) as u32,
        character_set: request.character_set.chars().collect(),
        constant_string: request.constant_string.clone(),
        tld: request.tld.clone(),
    };
    let total = total_possible_combinations(&params)?;
    if total < request.num_domains_to_generate {
        return Err(Error::validation(format!(
            "num_domains_to_generate ({}) exceeds total_possible_combinations ({total})",
            request.num_domains_to_generate
        )));
    }
    Ok(ValidatedGeneration { request, total_possible_combinations: total })
}

/// DNS validation rules (§4.9): at least one enabled DNS persona id; the
/// source campaign must be a generation campaign owned by the same user.
pub async fn validate_dns_validation(store: &Store, request: &CreateDnsValidationRequest) -> Result<()> {
    if request.persona_ids.is_empty() {
        return Err(Error::validation("at least one persona id is required"));
    }
    if request.batch_size <= 0 {
        return Err(Error::validation("batch_size must be positive"));
    }
    if request.retry_attempts < 1 {
        return Err(Error::validation("retry_attempts must be at least 1"));
    }

    let active = store.personas.get_active(PersonaType::Dns).await?;
    for id in &request.persona_ids {
        if !active.iter().any(|p| p.id == *id) {
            return Err(Error::validation(format!("persona {id} is not an enabled DNS persona")));
        }
    }

    let source = store.campaigns.get(request.source_generation_campaign_id).await?;
    if source.campaign_type != CampaignType::Generation {
        return Err(Error::validation("source campaign must be a generation campaign"));
    }
    if source.owner_user_id != request.owner_user_id {
        return Err(Error::validation("source campaign is not owned by the requesting user"));
    }

    Ok(())
}

/// HTTP keyword validation rules (§4.9): at least one enabled HTTP
/// persona id; at least one keyword source (set id or ad-hoc keyword);
/// proxy_pool_id XOR non-empty proxy_ids; source_type matches the source
/// campaign's actual type; ports in `[1, 65535]`.
pub async fn validate_http_keyword(store: &Store, request: &CreateHttpKeywordRequest) -> Result<()> {
    if request.persona_ids.is_empty() {
        return Err(Error::validation("at least one persona id is required"));
    }
    if request.keyword_set_ids.is_empty() && request.ad_hoc_keywords.is_empty() {
        return Err(Error::validation("at least one keyword set or ad-hoc keyword is required"));
    }
    if request.batch_size <= 0 {
        return Err(Error::validation("batch_size must be positive"));
    }
    if request.retry_attempts < 1 {
        return Err(Error::validation("retry_attempts must be at least 1"));
    }
    if request.target_http_ports.is_empty() {
        return Err(Error::validation("at least one target HTTP port is required"));
    }
    for port in &request.target_http_ports {
        if *port < 1 || *port > 65535 {
            return Err(Error::validation(format!("port {port} is out of range [1, 65535]")));
        }
    }

    let has_pool = request.proxy_pool_id.is_some();
    let has_ids = request.proxy_ids.as_ref().is_some_and(|ids| !ids.is_empty());
    if has_pool == has_ids {
        return Err(Error::validation(
            "exactly one of proxy_pool_id or a non-empty proxy_ids must be set",
        ));
    }

    let active = store.personas.get_active(PersonaType::Http).await?;
    for id in &request.persona_ids {
        if !active.iter().any(|p| p.id == *id) {
            return Err(Error::validation(format!("persona {id} is not an enabled HTTP persona")));
        }
    }

    if !request.keyword_set_ids.is_empty() {
        let found = store.keyword_sets.get_many(&request.keyword_set_ids).await?;
        if found.len() != request.keyword_set_ids.len() {
            return Err(Error::validation("one or more keyword_set_ids do not exist or are disabled"));
        }
    }

    let source = store.campaigns.get(request.source_campaign_id).await?;
    let expected_type = match request.source_type {
        SourceType::DomainGeneration => CampaignType::Generation,
        SourceType::DnsValidation => CampaignType::DnsValidation,
    };
    if source.campaign_type != expected_type {
        return Err(Error::validation("source_type does not match the source campaign's actual type"));
    }
    if source.owner_user_id != request.owner_user_id {
        return Err(Error::validation("source campaign is not owned by the requesting user"));
    }

    Ok(())
}
