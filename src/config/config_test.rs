use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_agent_sync_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("AGENT_SYNC__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = AgentSyncConfig::default();

    assert_eq!(config.topology.destination, "/events/topologies");
    assert_eq!(config.configs.destination, "/user/configs");
    assert_eq!(config.publisher.destination, "/user/commands");
    assert_eq!(config.publisher.unassigned_cluster_id, "-1");
    assert_eq!(config.publisher.custom_command_param, "custom_command");
    assert!(!config.publisher.trace_commands);
    assert_eq!(config.secrets.identity_file_name, "identity.dat");
    assert_eq!(config.secrets.data_directory_param, "data_directory");
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_agent_sync_env_vars();
    with_vars(
        vec![
            ("AGENT_SYNC__PUBLISHER__TRACE_COMMANDS", Some("true")),
            ("AGENT_SYNC__SECRETS__IDENTITY_FILE_NAME", Some("kerberos.dat")),
        ],
        || {
            let config = AgentSyncConfig::new().unwrap();

            assert!(config.publisher.trace_commands);
            assert_eq!(config.secrets.identity_file_name, "kerberos.dat");
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_agent_sync_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    std::fs::write(
        &config_path,
        r#"
        [topology]
        destination = "/events/topology-v2"

        [publisher]
        unassigned_cluster_id = "0"
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base_config = AgentSyncConfig::new().expect("success");
        let config = base_config
            .with_override_config(config_path.to_str().unwrap())
            .expect("override should load");

        assert_eq!(config.topology.destination, "/events/topology-v2");
        assert_eq!(config.publisher.unassigned_cluster_id, "0");
        assert_eq!(config.configs.destination, "/user/configs");
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_agent_sync_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
        [configs]
        destination = "/from/file"
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("AGENT_SYNC__CONFIGS__DESTINATION", Some("/from/env")),
        ],
        || {
            let config = AgentSyncConfig::new().unwrap();

            assert_eq!(config.configs.destination, "/from/env");
        },
    );
}

#[test]
fn validation_should_accept_defaults() {
    assert!(AgentSyncConfig::default().validate().is_ok());
}

#[test]
fn validation_should_reject_relative_destination() {
    let mut config = AgentSyncConfig::default();
    config.publisher.destination = "user/commands".to_string();

    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn validation_should_reject_identity_file_outside_data_directory() {
    for name in ["../identity.dat", "nested/identity.dat", "/identity.dat", ""] {
        let mut config = AgentSyncConfig::default();
        config.secrets.identity_file_name = name.to_string();

        assert!(config.validate().is_err(), "{name:?} should be rejected");
    }
}

#[test]
fn validation_should_reject_empty_param_keys() {
    let mut config = AgentSyncConfig::default();
    config.publisher.custom_command_param = " ".to_string();
    assert!(config.validate().is_err());

    let mut config = AgentSyncConfig::default();
    config.secrets.data_directory_param = String::new();
    assert!(config.validate().is_err());
}
