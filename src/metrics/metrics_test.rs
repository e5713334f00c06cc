use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("agent_sync".to_string()), None).unwrap();
    register_custom_metrics(&registry).unwrap();
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    HOLDER_UPDATES.with_label_values(&["topology", "true"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"agent_sync_holder_updates_total"),
        "Missing agent_sync_holder_updates_total"
    );
}

#[test]
fn test_counter_increment() {
    INJECTED_KEYTABS.with_label_values(&["test_increment"]).reset();

    INJECTED_KEYTABS.with_label_values(&["test_increment"]).inc();
    INJECTED_KEYTABS.with_label_values(&["test_increment"]).inc();

    let value = INJECTED_KEYTABS.with_label_values(&["test_increment"]).get();
    assert_eq!(value, 2, "Counter should increment correctly");
}

#[test]
fn test_gather_text_contains_registered_family() {
    let registry = create_test_registry();
    PUBLISHED_EVENTS.with_label_values(&["gather_text"]).inc();

    let body = gather_text(&registry);

    assert!(body.contains("agent_sync_published_events_total"));
}
