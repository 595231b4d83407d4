use domainflow_core::CampaignStatus;

/// The legal edge set for campaign transitions (§4.9). Retry-after-failure
/// is intentionally absent: a new campaign must be created instead, the
/// Job Queue already handles within-campaign transient retries.
pub fn is_legal_transition(from: CampaignStatus, to: CampaignStatus) -> bool {
    use CampaignStatus::*;
    matches!(
        (from, to),
        (Pending, Queued)
            | (Pending, Cancelled)
            | (Queued, Running)
            | (Queued, Cancelled)
            | (Running, Paused)
            | (Running, Completed)
            | (Running, Failed)
            | (Running, Cancelled)
            | (Paused, Running)
            | (Paused, Cancelled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use CampaignStatus::*;

    #[test]
    fn pending_can_advance_to_queued_or_be_cancelled() {
        assert!(is_legal_transition(Pending, Queued));
        assert!(is_legal_transition(Pending, Cancelled));
        assert!(!is_legal_transition(Pending, Running));
    }

    #[test]
    fn terminal_states_accept_no_further_transitions() {
        for terminal in [Completed, Failed, Cancelled] {
            for target in [Pending, Queued, Running, Paused, Completed, Failed, Cancelled] {
                assert!(!is_legal_transition(terminal, target), "{terminal:?} -> {target:?} should be illegal");
            }
        }
    }

    #[test]
    fn cancel_reaches_from_every_non_terminal_state() {
        assert!(is_legal_transition(Pending, Cancelled));
        assert!(is_legal_transition(Queued, Cancelled));
        assert!(is_legal_transition(Running, Cancelled));
        assert!(is_legal_transition(Paused, Cancelled));
    }
}
