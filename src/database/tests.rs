use super::*;
use crate::completion::Outcome;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn event(action: &str, resource: &str, data: Value) -> RawEvent {
    RawEvent::from_value(json!({
        "data": data,
        "context": {
            "eventId": "evt-1",
            "timestamp": "2024-05-01T12:00:00.000Z",
            "eventType": format!("providers/google.firebase.database/eventTypes/ref.{}", action),
            "resource": resource,
        }
    }))
    .unwrap()
}

#[test]
fn test_apply_delta() {
    let before = json!({ "name": "Ada", "age": 36, "tags": { "a": true } });
    let delta = json!({ "age": 37, "tags": { "a": null, "b": true }, "city": "London" });
    assert_eq!(
        apply_delta(&before, &delta),
        json!({ "name": "Ada", "age": 37, "tags": { "b": true }, "city": "London" })
    );
}

#[test]
fn test_apply_delta_replaces_and_deletes() {
    assert_eq!(apply_delta(&json!({ "a": 1 }), &json!("scalar")), json!("scalar"));
    assert_eq!(apply_delta(&json!({ "a": 1 }), &Value::Null), Value::Null);
    assert_eq!(apply_delta(&Value::Null, &json!({ "a": 1 })), json!({ "a": 1 }));
    assert_eq!(apply_delta(&json!({ "a": 1 }), &json!({ "a": null })), Value::Null);
    assert_eq!(apply_delta(&json!("old"), &json!({ "x": { "y": 2 } })), json!({ "x": { "y": 2 } }));
}

#[test]
fn test_snapshot_navigation() {
    let snapshot = DataSnapshot::new(
        Some("demo".to_string()),
        "/users/alice",
        json!({ "name": "Alice", "posts": { "p2": { "likes": 3 }, "p1": { "likes": 1 } }, "gone": null }),
    );

    assert_eq!(snapshot.key(), Some("alice"));
    assert_eq!(snapshot.path(), "users/alice");
    assert_eq!(snapshot.instance(), Some("demo"));
    assert!(snapshot.exists());
    assert_eq!(snapshot.num_children(), 2);
    assert!(snapshot.has_child("posts/p1/likes"));
    assert!(!snapshot.has_child("gone"));
    assert!(!snapshot.has_child("posts/p9"));

    let likes = snapshot.child("posts/p2/likes");
    assert_eq!(likes.key(), Some("likes"));
    assert_eq!(likes.path(), "users/alice/posts/p2/likes");
    assert_eq!(likes.val(), Some(&json!(3)));

    let keys: Vec<String> = snapshot
        .child("posts")
        .children()
        .iter()
        .map(|c| c.key().unwrap_or_default().to_string())
        .collect();
    assert_eq!(keys, vec!["p1", "p2"]);
}

#[test]
fn test_snapshot_array_and_ordering() {
    let snapshot = DataSnapshot::new(None, "list", json!({ "10": "c", "9": "b", "x": "d", "1": "a" }));
    let values: Vec<Value> = snapshot.children().iter().map(|c| c.to_json()).collect();
    assert_eq!(values, vec![json!("a"), json!("b"), json!("c"), json!("d")]);

    let array = DataSnapshot::new(None, "arr", json!(["zero", null, "two"]));
    assert_eq!(array.num_children(), 2);
    assert_eq!(array.child("2").val(), Some(&json!("two")));
}

#[test]
fn test_empty_snapshot() {
    let snapshot = DataSnapshot::new(None, "/", json!({ "a": null }));
    assert!(!snapshot.exists());
    assert_eq!(snapshot.key(), None);
    assert_eq!(snapshot.val(), None);
    assert_eq!(snapshot.val_as::<String>().unwrap(), None);
    assert_eq!(snapshot.to_json(), Value::Null);
    assert!(!snapshot.has_children());
}

#[test]
fn test_val_as() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        name: String,
    }
    let snapshot = DataSnapshot::new(None, "users/a", json!({ "name": "Ada" }));
    assert_eq!(
        snapshot.val_as::<User>().unwrap(),
        Some(User { name: "Ada".to_string() })
    );
}

#[test]
fn test_trigger_metadata() {
    let function = reference("/users/{uid}")
        .instance("demo-default-rtdb")
        .on_write(|_change, _ctx| Completion::Done);
    let trigger = function.trigger();
    assert_eq!(
        trigger.event_type,
        "providers/google.firebase.database/eventTypes/ref.write"
    );
    assert_eq!(
        trigger.resource,
        "projects/_/instances/demo-default-rtdb/refs/users/{uid}"
    );
    assert_eq!(trigger.service, "firebaseio.com");

    let default_instance = reference("messages").on_create(|_s, _c| Completion::Done);
    assert_eq!(
        default_instance.trigger().resource,
        format!("projects/_/instances/{}/refs/messages", super::default_instance())
    );
}

#[test]
fn test_default_instance_follows_project() {
    let from_project = FirebaseConfig {
        project_id: Some("demo".to_string()),
        ..Default::default()
    };
    assert_eq!(instance_from_config(Some(&from_project)), "demo-default-rtdb");
    assert_eq!(
        reference("messages").resource_on(&instance_from_config(Some(&from_project))),
        "projects/_/instances/demo-default-rtdb/refs/messages"
    );

    let from_url = FirebaseConfig {
        project_id: Some("demo".to_string()),
        database_url: Some("https://demo-eu.europe-west1.firebasedatabase.app".to_string()),
        ..Default::default()
    };
    assert_eq!(instance_from_config(Some(&from_url)), "demo-eu");

    assert_eq!(instance_from_config(Some(&FirebaseConfig::default())), "_");
    assert_eq!(instance_from_config(None), "_");
}

#[test]
fn test_on_create_receives_after_snapshot_and_params() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let function = reference("/users/{uid}").on_create(move |snapshot, ctx| {
        *sink.lock().unwrap() = Some((snapshot, ctx.params.clone()));
    });

    let outcome = function
        .run(event(
            "create",
            "projects/_/instances/demo/refs/users/alice",
            json!({ "data": null, "delta": { "name": "Alice" } }),
        ))
        .unwrap();
    assert!(matches!(outcome, Outcome::Placeholder));

    let (snapshot, params) = seen.lock().unwrap().take().unwrap();
    assert_eq!(snapshot.val(), Some(&json!({ "name": "Alice" })));
    assert_eq!(snapshot.instance(), Some("demo"));
    assert_eq!(snapshot.key(), Some("alice"));
    assert_eq!(params["uid"], "alice");
}

#[test]
fn test_on_delete_receives_before_snapshot() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let function = reference("/users/{uid}").on_delete(move |snapshot, _ctx| {
        *sink.lock().unwrap() = Some(snapshot.to_json());
    });

    function
        .run(event(
            "delete",
            "projects/_/instances/demo/refs/users/alice",
            json!({ "data": { "name": "Alice" }, "delta": null }),
        ))
        .unwrap();
    assert_eq!(seen.lock().unwrap().take(), Some(json!({ "name": "Alice" })));
}

#[tokio::test]
async fn test_on_update_change_and_pending_completion() {
    let function = reference("/counters/{id}").on_update(|change, _ctx| {
        let before = change.before.val_as::<i64>();
        let after = change.after.val_as::<i64>();
        Completion::pending(async move {
            let delta = after?.unwrap_or(0) - before?.unwrap_or(0);
            Ok::<_, anyhow::Error>(delta)
        })
    });

    let outcome = function
        .run(event(
            "update",
            "projects/_/instances/_/refs/counters/c1",
            json!({ "data": 4, "delta": 9 }),
        ))
        .unwrap();
    assert_eq!(outcome.settle().await.unwrap(), Some(json!(5)));
}

#[test]
fn test_bad_payload_is_a_trigger_error() {
    let function = reference("/a").on_write(|_c, _ctx| Completion::Done);
    let err = function
        .run(event("write", "projects/_/instances/_/refs/a", json!("nope")))
        .unwrap_err();
    assert!(matches!(err, TriggerError::InvalidPayload { .. }));
}

#[test]
fn test_malformed_timestamp_is_propagated() {
    let function = reference("/a").on_write(|_c, _ctx| Completion::Done);
    let mut raw = event("write", "projects/_/instances/_/refs/a", json!({}));
    raw.context.timestamp = "not-a-date".to_string();
    assert!(matches!(function.run(raw), Err(TriggerError::Context(_))));
}
