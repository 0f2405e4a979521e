use std::collections::HashMap;

use carehub_api::config::{LogFormat, ServiceConfig, StoreKind};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_without_file_or_env() {
    let config = ServiceConfig::default().apply_overrides(env(&[])).unwrap();
    assert_eq!(config.bind, "127.0.0.1:8080");
    assert_eq!(config.store, StoreKind::Memory);
    assert_eq!(config.bucket, "carehub");
    assert_eq!(config.log_format, LogFormat::Pretty);
}

#[test]
fn unversioned_file_is_stamped_and_kept() {
    let config = ServiceConfig::from_json(r#"{ "bind": "0.0.0.0:9000", "store": "s3" }"#).unwrap();
    assert_eq!(config.config_version, 1);
    assert_eq!(config.bind, "0.0.0.0:9000");
    assert_eq!(config.store, StoreKind::S3);
}

#[test]
fn migration_does_not_rename_fields() {
    // `listen` was never a setting; it must not be taken for `bind`.
    let config = ServiceConfig::from_json(r#"{ "listen": "0.0.0.0:9000" }"#).unwrap();
    assert_eq!(config.config_version, 1);
    assert_eq!(config.bind, "127.0.0.1:8080");
}

#[test]
fn newer_config_version_is_refused() {
    let err = ServiceConfig::from_json(r#"{ "config_version": 99 }"#).unwrap_err();
    assert!(err.to_string().contains("newer than this build supports"));
}

#[test]
fn environment_overrides_file_values() {
    let config = ServiceConfig::from_json(r#"{ "config_version": 1, "bucket": "from-file" }"#)
        .unwrap()
        .apply_overrides(env(&[
            ("CAREHUB_BUCKET", "from-env"),
            ("CAREHUB_LOG_FORMAT", "json"),
        ]))
        .unwrap();
    assert_eq!(config.bucket, "from-env");
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
fn unknown_store_kind_is_an_error() {
    let result = ServiceConfig::default().apply_overrides(env(&[("CAREHUB_STORE", "sqlite")]));
    assert!(result.is_err());
}
