use super::*;

#[test]
fn test_memory_parse_and_display() {
    assert_eq!("256MB".parse::<Memory>().unwrap(), Memory::Mb256);
    assert_eq!("2gb".parse::<Memory>().unwrap(), Memory::Gb2);
    assert_eq!(Memory::Gb1.megabytes(), 1024);
    assert_eq!(Memory::Mb512.to_string(), "512MB");
    assert_eq!(
        "3GB".parse::<Memory>().unwrap_err(),
        OptionsError::InvalidMemory("3GB".to_string())
    );
}

#[test]
fn test_memory_serde() {
    let options: RuntimeOptions =
        serde_json::from_str(r#"{ "memory": "1GB", "timeoutSeconds": 60 }"#).unwrap();
    assert_eq!(options.memory, Some(Memory::Gb1));
    assert_eq!(options.timeout_seconds, Some(60));

    let json = serde_json::to_value(&options).unwrap();
    assert_eq!(json, serde_json::json!({ "memory": "1GB", "timeoutSeconds": 60 }));

    assert!(serde_json::from_str::<RuntimeOptions>(r#"{ "memory": "lots" }"#).is_err());
}

#[test]
fn test_timeout_limit() {
    let ok = RuntimeOptions {
        timeout_seconds: Some(MAX_TIMEOUT_SECONDS),
        ..Default::default()
    };
    assert!(ok.validate().is_ok());

    let too_long = RuntimeOptions {
        timeout_seconds: Some(541),
        ..Default::default()
    };
    assert_eq!(too_long.validate(), Err(OptionsError::TimeoutTooLong(541)));
    assert!(run_with(too_long).is_err());
}

#[test]
fn test_instance_bounds() {
    let options = RuntimeOptions {
        min_instances: Some(5),
        max_instances: Some(2),
        ..Default::default()
    };
    assert_eq!(
        options.validate(),
        Err(OptionsError::InstanceBounds { min: 5, max: 2 })
    );
}

#[test]
fn test_regions() {
    let builder = region(&["europe-west1", "us-east1"]).unwrap();
    assert_eq!(builder.options().regions, vec!["europe-west1", "us-east1"]);
    assert_eq!(builder.options().primary_region(), "europe-west1");

    assert_eq!(region(&[]).unwrap_err(), OptionsError::NoRegions);
    assert_eq!(
        region(&["mars-north1"]).unwrap_err(),
        OptionsError::UnsupportedRegion("mars-north1".to_string())
    );
}

#[test]
fn test_default_region() {
    let options = DeploymentOptions::default();
    assert_eq!(options.effective_regions(), vec![DEFAULT_REGION.to_string()]);
    assert_eq!(options.primary_region(), DEFAULT_REGION);
}
