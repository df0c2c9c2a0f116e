pub mod client;
pub mod health;

use std::time::Duration;

use tracing::{debug, warn};

use crate::models::recipient::Recipient;
use crate::push::client::{PushError, PushMessage};
use crate::state::AppState;

/// One batched multicast to every active token of a recipient, with a small
/// bounded retry on transport failure. Per-token provider failures are fed
/// to the token health pass; transport failures are eventually dropped with
/// a log entry. Returns the number of tokens that accepted delivery.
pub async fn send_to_recipient(
    state: &AppState,
    recipient: Recipient,
    message: &PushMessage,
) -> Result<usize, PushError> {
    let tokens = state.active_tokens_for(recipient);
    if tokens.is_empty() {
        debug!(?recipient, "no active device tokens; skipping push");
        return Ok(0);
    }

    let attempts = state.push_retry_attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match state.push.send_multicast(message, &tokens).await {
            Ok(outcomes) => {
                let delivered = outcomes.iter().filter(|o| o.error.is_none()).count();
                let dead = health::process_outcomes(state, &outcomes);
                if dead > 0 {
                    warn!(?recipient, dead, "deactivated dead device tokens");
                }
                state
                    .metrics
                    .push_sends_total
                    .with_label_values(&["success"])
                    .inc();
                return Ok(delivered);
            }
            Err(err) => {
                warn!(?recipient, attempt, error = %err, "push multicast failed");
                last_err = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            }
        }
    }

    state
        .metrics
        .push_sends_total
        .with_label_values(&["failure"])
        .inc();
    Err(last_err.unwrap_or_else(|| PushError::Transport("exhausted retries".to_string())))
}
