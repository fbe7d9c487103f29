//! Telemetry logic.
//! Support logging and metrics.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

const AUTHENTICATIONS_TOTAL: &str = "crowd_realm_authentications_total";
const LOOKUPS_TOTAL: &str = "crowd_realm_lookups_total";

/// Install a global log subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Fails if the host already
/// installed a subscriber.
pub fn init_tracing(default_filter: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Count an authentication attempt by outcome.
pub fn record_authentication(outcome: &'static str) {
    metrics::counter!(AUTHENTICATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Count a user or group lookup by outcome.
pub fn record_lookup(kind: &'static str, outcome: &'static str) {
    metrics::counter!(LOOKUPS_TOTAL, "kind" => kind, "outcome" => outcome)
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // the first call may lose against another test, never the second.
        let _ = init_tracing("info");
        assert!(init_tracing("info").is_err());
    }
}
