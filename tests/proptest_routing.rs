//! Property-based tests for the routing document and domain edits
//!
//! Generates arbitrary routing documents and domain lists and checks the
//! invariants the read-modify-write cycle relies on.

use proptest::prelude::*;
use serde_json::{Map, Value};

use xkeen_domains::domain::routing::PortFilter;
use xkeen_domains::domain::use_cases::xkeen::XkeenCommandBuilder;
use xkeen_domains::domain::{DomainEdit, Routing, RoutingConfig, Rule};

fn domain_name() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}\\.(com|net|org|ru)"
}

fn port_filter() -> impl Strategy<Value = PortFilter> {
    prop_oneof![
        any::<u16>().prop_map(PortFilter::Single),
        "[0-9]{2,5}(,[0-9]{2,5}){0,3}".prop_map(PortFilter::List),
    ]
}

fn rule() -> impl Strategy<Value = Rule> {
    (
        prop_oneof![Just("field".to_string()), Just(String::new())],
        proptest::option::of("[a-z-]{1,16}"),
        proptest::option::of(prop::collection::vec(domain_name(), 0..8)),
        proptest::option::of(prop_oneof![Just("tcp".to_string()), Just("udp".to_string())]),
        proptest::option::of(port_filter()),
        proptest::option::of(prop::collection::vec("[0-9.]{7,15}", 0..3)),
        proptest::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(rule_type, tag, domain, network, port, ip, balancer)| {
            let mut extra = Map::new();
            if let Some(balancer) = balancer {
                extra.insert("balancerTag".to_string(), Value::String(balancer));
            }
            Rule {
                rule_type,
                outbound_tag: tag,
                inbound_tag: None,
                domain,
                network,
                port,
                ip,
                extra,
            }
        })
}

fn routing_config() -> impl Strategy<Value = RoutingConfig> {
    (
        prop::collection::vec(rule(), 0..6),
        proptest::option::of(prop_oneof![
            Just("AsIs".to_string()),
            Just("IPIfNonMatch".to_string())
        ]),
    )
        .prop_map(|(rules, strategy)| {
            let mut extra = Map::new();
            if let Some(strategy) = strategy {
                extra.insert("domainStrategy".to_string(), Value::String(strategy));
            }
            RoutingConfig {
                routing: Routing { rules, extra },
                extra: Map::new(),
            }
        })
}

/// Managed rule with a duplicate-free domain list
fn managed_rule() -> impl Strategy<Value = Rule> {
    prop::collection::btree_set(domain_name(), 0..10).prop_map(|set| Rule {
        rule_type: "field".to_string(),
        outbound_tag: Some("vless-reality".to_string()),
        domain: Some(set.into_iter().collect()),
        ..Default::default()
    })
}

fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

// ===== Document Round-Trip Properties =====

proptest! {
    /// Serializing then parsing reproduces the same document.
    #[test]
    fn routing_config_round_trips(config in routing_config()) {
        let text = config.to_json_pretty().unwrap();
        let parsed = RoutingConfig::from_json(&text).unwrap();
        prop_assert_eq!(parsed, config);
    }

    /// Absent optional fields never appear as `null`.
    #[test]
    fn absent_fields_are_not_serialized_as_null(config in routing_config()) {
        let text = config.to_json_pretty().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        prop_assert!(!contains_null(&value), "null in output: {text}");
    }

    /// The write command carries the document through shell quoting intact.
    #[test]
    fn write_command_preserves_content(config in routing_config(), quote in "[a-z' ]{0,10}") {
        let mut config = config;
        config.extra.insert("note".to_string(), Value::String(quote));
        let json = config.to_json_pretty().unwrap();
        let path = "/opt/etc/xray/configs/05_routing.json";

        let command = XkeenCommandBuilder::build_write_command(path, &json);
        let suffix = format!("' > {path}");
        let quoted = command
            .strip_prefix("echo '")
            .and_then(|rest| rest.strip_suffix(suffix.as_str()))
            .unwrap();
        prop_assert_eq!(quoted.replace("'\\''", "'"), json);
    }
}

// ===== Domain Edit Properties =====

proptest! {
    /// Adding the same entries twice equals adding them once.
    #[test]
    fn add_is_idempotent(
        rule in managed_rule(),
        new in prop::collection::vec(domain_name(), 0..6),
    ) {
        let mut once = rule;
        DomainEdit::Add(new.clone()).apply(&mut once);
        let mut twice = once.clone();
        let changed = DomainEdit::Add(new).apply(&mut twice);

        prop_assert_eq!(changed, 0);
        prop_assert_eq!(twice, once);
    }

    /// Existing entries keep their order and every new entry is present
    /// exactly once afterwards.
    #[test]
    fn add_appends_without_duplicates(
        rule in managed_rule(),
        new in prop::collection::vec(prop_oneof![domain_name(), Just(String::new()), Just("  ".to_string())], 0..8),
    ) {
        let before = rule.domain.clone().unwrap_or_default();
        let mut edited = rule;
        DomainEdit::Add(new.clone()).apply(&mut edited);
        let after = edited.domain.unwrap_or_default();

        prop_assert_eq!(&after[..before.len()], &before[..]);
        for entry in new.iter().filter(|e| !e.trim().is_empty()) {
            prop_assert_eq!(after.iter().filter(|d| *d == entry).count(), 1);
        }
        prop_assert!(after.iter().all(|d| !d.trim().is_empty()));
    }

    /// Removed entries are gone and the rest keep their order.
    #[test]
    fn remove_drops_only_named_entries(
        rule in managed_rule(),
        gone in prop::collection::vec(domain_name(), 0..6),
    ) {
        let before = rule.domain.clone().unwrap_or_default();
        let mut edited = rule;
        let changed = DomainEdit::Remove(gone.clone()).apply(&mut edited);
        let after = edited.domain.unwrap_or_default();

        let expected: Vec<String> = before.iter().filter(|d| !gone.contains(d)).cloned().collect();
        prop_assert_eq!(changed, before.len() - after.len());
        prop_assert_eq!(after, expected);
    }

    /// Removing what was just added restores the original list.
    #[test]
    fn remove_undoes_add_of_fresh_entries(
        rule in managed_rule(),
        new in prop::collection::btree_set("[a-z]{1,8}\\.example", 0..5),
    ) {
        let new: Vec<String> = new.into_iter().collect();
        let original = rule.clone();
        let mut edited = rule;
        DomainEdit::Add(new.clone()).apply(&mut edited);
        DomainEdit::Remove(new).apply(&mut edited);

        prop_assert_eq!(edited, original);
    }
}
