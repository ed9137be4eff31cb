use super::*;
use crate::completion::Completion;
use crate::https::{self, Bytes, Request, StatusCode};
use crate::options::{self, Memory, RuntimeOptions};
use crate::{database, pubsub};
use serde_json::json;

fn write_event() -> RawEvent {
    RawEvent::from_value(json!({
        "data": { "data": null, "delta": { "name": "ada" } },
        "context": {
            "eventId": "db-1",
            "timestamp": "2024-01-01T00:00:00Z",
            "eventType": "providers/google.firebase.database/eventTypes/ref.write",
            "resource": "projects/_/instances/demo/refs/users/ada",
            "params": { "uid": "ada" }
        }
    }))
    .unwrap()
}

#[test]
fn test_register_and_get() {
    let mut registry = Registry::new();
    assert!(registry.is_empty());

    registry
        .register("onUserWrite", database::reference("/users/{uid}").on_write(|_c, _ctx| Completion::Done))
        .unwrap();
    registry
        .register("hello", https::on_request(|_req: Request<Bytes>| async { "hi" }))
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.get("onUserWrite").unwrap().as_event().is_some());
    assert!(registry.get("hello").unwrap().as_https().is_some());
    assert!(registry.get("missing").is_none());
    assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["hello", "onUserWrite"]);
}

#[test]
fn test_register_any_rejects_other_shapes() {
    let mut registry = Registry::new();

    let function = pubsub::topic("events").on_publish(|_m, _c| Completion::Done);
    registry.register_any("events", Box::new(function)).unwrap();

    let err = registry.register_any("bogus", Box::new("not a function")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidShape(key) if key == "bogus"));

    let err = registry.register_any("number", Box::new(42_u32)).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidShape(_)));

    assert_eq!(registry.len(), 1);
    assert!(registry.contains("events"));
}

#[test]
fn test_invalid_keys() {
    let mut registry = Registry::new();
    let too_long = "a".repeat(64);
    for key in ["", "1abc", "has space", "dots.not.allowed", too_long.as_str()] {
        let err = registry
            .register(key, pubsub::topic("t").on_publish(|_m, _c| Completion::Done))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidKey(_)), "{key}");
    }
    registry
        .register("ok-name_2", pubsub::topic("t").on_publish(|_m, _c| Completion::Done))
        .unwrap();
}

#[test]
fn test_invalid_trigger_fails_at_registration() {
    let mut registry = Registry::new();
    let err = registry
        .register("bad", pubsub::topic("a/b").on_publish(|_m, _c| Completion::Done))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidTrigger { .. }));
    assert!(registry.is_empty());
}

#[test]
fn test_duplicate_key_replaces() {
    let mut registry = Registry::new();
    registry
        .register("fn", pubsub::topic("first").on_publish(|_m, _c| Completion::Done))
        .unwrap();
    registry
        .register("fn", pubsub::topic("second").on_publish(|_m, _c| Completion::Done))
        .unwrap();

    assert_eq!(registry.len(), 1);
    let function = registry.get("fn").unwrap().as_event().unwrap();
    assert!(function.trigger().resource.ends_with("/topics/second"));
}

#[tokio::test]
async fn test_dispatch_event() {
    let mut registry = Registry::new();
    registry
        .register(
            "onUserWrite",
            database::reference("/users/{uid}").on_write(|change, ctx| {
                let name = change.after.val().cloned().unwrap_or_default();
                Completion::pending(async move {
                    Ok::<_, anyhow::Error>(json!({ "uid": ctx.params["uid"], "name": name["name"] }))
                })
            }),
        )
        .unwrap();
    registry
        .register("hello", https::on_request(|_req: Request<Bytes>| async { StatusCode::OK }))
        .unwrap();

    let outcome = registry.dispatch_event("onUserWrite", write_event()).unwrap();
    assert_eq!(
        outcome.settle().await.unwrap(),
        Some(json!({ "uid": "ada", "name": "ada" }))
    );

    assert!(matches!(
        registry.dispatch_event("hello", write_event()),
        Err(RegistryError::NotAnEventFunction(_))
    ));
    assert!(matches!(
        registry.dispatch_event("nope", write_event()),
        Err(RegistryError::UnknownFunction(_))
    ));
}

#[test]
fn test_manifest() {
    let builder = options::region(&["europe-west1"])
        .unwrap()
        .run_with(RuntimeOptions {
            memory: Some(Memory::Mb512),
            timeout_seconds: Some(60),
            ..Default::default()
        })
        .unwrap();

    let mut registry = Registry::new();
    registry
        .register("api", builder.https_on_request(|_req: Request<Bytes>| async { "ok" }))
        .unwrap();
    registry
        .register("cleanup", pubsub::schedule("every 5 minutes").on_run(|_ctx| Completion::Done))
        .unwrap();

    let manifest = serde_json::to_value(registry.manifest()).unwrap();
    assert_eq!(manifest["specVersion"], "v1alpha1");

    let api = &manifest["endpoints"]["api"];
    assert_eq!(api["entryPoint"], "api");
    assert_eq!(api["region"], json!(["europe-west1"]));
    assert_eq!(api["availableMemoryMb"], 512);
    assert_eq!(api["timeoutSeconds"], 60);
    assert_eq!(api["httpsTrigger"], json!({}));
    assert!(api.get("eventTrigger").is_none());

    let cleanup = &manifest["endpoints"]["cleanup"];
    assert_eq!(cleanup["region"], json!(["us-central1"]));
    assert_eq!(cleanup["eventTrigger"]["eventType"], "google.pubsub.topic.publish");
    assert!(cleanup["eventTrigger"]["resource"]
        .as_str()
        .unwrap()
        .ends_with("/topics/firebase-schedule-cleanup-us-central1"));
    assert_eq!(cleanup["schedule"]["schedule"], "every 5 minutes");
    assert!(cleanup.get("httpsTrigger").is_none());
}
