//! Property-based tests for issuer configuration and event selection.

use auth_caep::FixedClock;
use proptest::prelude::*;
use set_issuer::events::default_events;
use set_issuer::{Config, ConfigError};
use std::collections::HashMap;
use test_utils::epoch_seconds_strategy;

fn config(vars: &[(&str, String)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
    Config::from_lookup(|name| vars.get(name).cloned())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Audience and endpoint follow the receiver domain when not set explicitly.
    #[test]
    fn prop_target_follows_domain(host in "[a-z]{1,12}", tld in "[a-z]{2,6}") {
        let domain = format!("{host}.{tld}");
        let config = config(&[
            ("SET_RECEIVER_DOMAIN", domain.clone()),
            ("SET_ISSUER", "https://issuer.example".to_string()),
        ]).unwrap();

        let target = config.delivery_target().unwrap();
        prop_assert_eq!(target.audience, format!("https://{domain}"));
        prop_assert_eq!(
            target.endpoint.as_str(),
            format!("https://{domain}/security/api/v1/security-events")
        );
    }

    /// Key sizes are accepted exactly within 2048..=8192.
    #[test]
    fn prop_key_bits_range(bits in 0usize..16_384) {
        let result = config(&[("SET_KEY_BITS", bits.to_string())]);
        prop_assert_eq!(result.is_ok(), (2048..=8192).contains(&bits));
    }

    /// Default events always carry the subject and the emission time.
    #[test]
    fn prop_default_events_subject(
        user in "[a-z0-9.]{1,16}",
        now in epoch_seconds_strategy(),
    ) {
        let email = format!("{user}@example.com");
        let events = default_events(&email, None, &FixedClock::at_epoch_seconds(now));

        for event in &events {
            let body = event.body().unwrap();
            prop_assert_eq!(body["subject"]["user"]["email"].as_str(), Some(email.as_str()));
            prop_assert_eq!(body["event_timestamp"].as_i64(), Some(now));
        }
    }
}
