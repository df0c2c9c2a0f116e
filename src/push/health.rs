use crate::push::client::TokenOutcome;
use crate::state::AppState;

/// Token health pass over one multicast result: registrations the provider
/// reports permanently invalid are deactivated in a single batched pass.
/// Transient failures leave the token active for the next event. Idempotent
/// under concurrent fanout calls deactivating the same token.
pub fn process_outcomes(state: &AppState, outcomes: &[TokenOutcome]) -> usize {
    let dead: Vec<&str> = outcomes
        .iter()
        .filter(|outcome| outcome.error.is_some_and(|kind| kind.is_permanent()))
        .map(|outcome| outcome.token.as_str())
        .collect();

    let mut deactivated = 0;
    for token in &dead {
        if let Some(mut entry) = state.device_tokens.get_mut(*token) {
            if entry.is_active {
                entry.is_active = false;
                deactivated += 1;
            }
        }
    }

    if deactivated > 0 {
        state
            .metrics
            .device_tokens_deactivated_total
            .inc_by(deactivated as u64);
    }

    deactivated
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::process_outcomes;
    use crate::config::Config;
    use crate::models::device_token::DeviceToken;
    use crate::models::recipient::Recipient;
    use crate::push::client::{NoopPushClient, PushErrorKind, TokenOutcome};
    use crate::state::AppState;

    fn state_with_tokens(tokens: &[&str]) -> AppState {
        let (state, _rx) = AppState::new(&Config::default(), Arc::new(NoopPushClient));
        for token in tokens {
            state.device_tokens.insert(
                token.to_string(),
                DeviceToken {
                    token: token.to_string(),
                    recipient: Recipient::Customer(1),
                    is_active: true,
                    registered_at: Utc::now(),
                },
            );
        }
        state
    }

    fn outcome(token: &str, error: Option<PushErrorKind>) -> TokenOutcome {
        TokenOutcome {
            token: token.to_string(),
            error,
        }
    }

    #[test]
    fn permanent_failure_deactivates_token() {
        let state = state_with_tokens(&["dead", "alive"]);
        let deactivated = process_outcomes(
            &state,
            &[
                outcome("dead", Some(PushErrorKind::Unregistered)),
                outcome("alive", None),
            ],
        );

        assert_eq!(deactivated, 1);
        assert!(!state.device_tokens.get("dead").unwrap().is_active);
        assert!(state.device_tokens.get("alive").unwrap().is_active);
    }

    #[test]
    fn transient_failure_keeps_token_active() {
        let state = state_with_tokens(&["flaky"]);
        let deactivated =
            process_outcomes(&state, &[outcome("flaky", Some(PushErrorKind::RateLimited))]);

        assert_eq!(deactivated, 0);
        assert!(state.device_tokens.get("flaky").unwrap().is_active);
    }

    #[test]
    fn deactivation_is_idempotent() {
        let state = state_with_tokens(&["dead"]);
        let outcomes = [outcome("dead", Some(PushErrorKind::InvalidToken))];

        assert_eq!(process_outcomes(&state, &outcomes), 1);
        assert_eq!(process_outcomes(&state, &outcomes), 0);
    }

    #[test]
    fn unknown_token_is_ignored() {
        let state = state_with_tokens(&[]);
        let deactivated =
            process_outcomes(&state, &[outcome("ghost", Some(PushErrorKind::Unregistered))]);
        assert_eq!(deactivated, 0);
    }
}
