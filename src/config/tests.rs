use super::*;
use serde_json::json;
use std::io::Write;

fn sample() -> Config {
    Config::new(json!({
        "stripe": { "key": "sk_test", "webhook": { "secret": "whsec" } },
        "limits": { "max": 10 },
        "flag": true
    }))
}

#[test]
fn test_full_path_returns_leaf() {
    let config = sample();
    assert_eq!(config.get("stripe.key"), Some(&json!("sk_test")));
    assert_eq!(config.get_str("stripe.webhook.secret"), Some("whsec"));
    assert_eq!(config.get("limits.max"), Some(&json!(10)));
    assert_eq!(config.get("stripe.webhook"), Some(&json!({ "secret": "whsec" })));
}

#[test]
fn test_missing_segment_returns_none() {
    let config = sample();
    assert_eq!(config.get("stripe.missing"), None);
    assert_eq!(config.get("nope.key"), None);
    assert_eq!(config.get(""), None);
    assert_eq!(config.get("stripe..key"), None);
}

#[test]
fn test_non_object_segment_returns_none() {
    let config = sample();
    assert_eq!(config.get("stripe.key.length"), None);
    assert_eq!(config.get("flag.value"), None);
}

#[test]
fn test_get_as() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Limits {
        max: u32,
    }
    let config = sample();
    assert_eq!(config.get_as::<Limits>("limits").unwrap(), Some(Limits { max: 10 }));
    assert_eq!(config.get_as::<Limits>("absent").unwrap(), None);
    assert!(config.get_as::<Limits>("stripe").is_err());
}

#[test]
fn test_load_inline_json() {
    let config = Config::load(Some(r#"{ "service": { "url": "https://x" } }"#), None).unwrap();
    assert_eq!(config.get_str("service.url"), Some("https://x"));
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "mail": {{ "from": "noreply@example.com" }} }}"#).unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let config = Config::load(Some(&path), None).unwrap();
    assert_eq!(config.get_str("mail.from"), Some("noreply@example.com"));
}

#[test]
fn test_load_falls_back_to_runtimeconfig_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".runtimeconfig.json"),
        r#"{ "emulator": { "on": true } }"#,
    )
    .unwrap();

    let config = Config::load(None, Some(dir.path())).unwrap();
    assert_eq!(config.get("emulator.on"), Some(&json!(true)));
}

#[test]
fn test_missing_sources_give_empty_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(None, Some(dir.path())).unwrap();
    assert_eq!(config.get("anything"), None);
    assert_eq!(config.as_value(), &json!({}));
}

#[test]
fn test_invalid_sources_are_errors() {
    assert!(matches!(
        Config::load(Some("{ not json"), None),
        Err(ConfigError::Json { .. })
    ));
    assert!(matches!(
        Config::load(Some("/definitely/not/here.json"), None),
        Err(ConfigError::Io { .. })
    ));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[1, 2]").unwrap();
    let path = file.path().to_str().unwrap().to_string();
    assert!(matches!(
        Config::load(Some(&path), None),
        Err(ConfigError::NotAnObject(_))
    ));
}

#[test]
fn test_firebase_namespace() {
    let firebase: FirebaseConfig = serde_json::from_value(json!({
        "projectId": "demo",
        "databaseURL": "https://demo.firebaseio.com",
    }))
    .unwrap();
    let config = sample().with_firebase(firebase);

    assert_eq!(config.get_str("firebase.projectId"), Some("demo"));
    assert_eq!(
        config.get_str("firebase.databaseURL"),
        Some("https://demo.firebaseio.com")
    );
    let firebase = config.firebase().unwrap();
    assert_eq!(firebase.default_bucket().as_deref(), Some("demo.appspot.com"));
    assert_eq!(
        firebase.default_database_url().as_deref(),
        Some("https://demo.firebaseio.com")
    );
}

#[test]
fn test_default_database_url() {
    let firebase = FirebaseConfig {
        project_id: Some("demo".to_string()),
        ..Default::default()
    };
    assert_eq!(
        firebase.default_database_url().as_deref(),
        Some("https://demo-default-rtdb.firebaseio.com")
    );
    assert_eq!(FirebaseConfig::default().default_bucket(), None);
}
