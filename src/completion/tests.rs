use super::*;
use serde_json::json;
use tokio::sync::oneshot;

#[test]
fn test_done_becomes_placeholder() {
    let outcome = Completion::from(()).into_outcome();
    assert!(outcome.is_placeholder());
}

#[tokio::test]
async fn test_placeholder_settles_immediately() {
    let settled = Outcome::Placeholder.settle().await.unwrap();
    assert_eq!(settled, None);
}

#[tokio::test]
async fn test_pending_resolves_with_handler_value() {
    let completion = Completion::pending(async { Ok::<_, anyhow::Error>(json!({ "written": 3 })) });
    assert!(completion.is_pending());

    let settled = completion.into_outcome().settle().await.unwrap();
    assert_eq!(settled, Some(json!({ "written": 3 })));
}

#[tokio::test]
async fn test_pending_unit_resolves_to_null() {
    let completion = Completion::pending(async { Ok::<(), anyhow::Error>(()) });
    let settled = completion.into_outcome().settle().await.unwrap();
    assert_eq!(settled, Some(serde_json::Value::Null));
}

#[tokio::test]
async fn test_pending_failure_propagates_the_same_error() {
    let completion = Completion::pending(async {
        Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
    });
    let err = completion.into_outcome().settle().await.unwrap_err();
    assert_eq!(err.to_string(), "disk on fire");
    assert!(err.into_inner().downcast_ref::<std::io::Error>().is_some());
}

#[tokio::test]
async fn test_outcome_waits_for_the_pending_future() {
    let (tx, rx) = oneshot::channel::<String>();
    let completion = Completion::pending(async move { rx.await.map_err(anyhow::Error::from) });
    let outcome = completion.into_outcome();

    let waiter = tokio::spawn(outcome.settle());
    assert!(!waiter.is_finished());

    tx.send("payload".to_string()).unwrap();
    let settled = waiter.await.unwrap().unwrap();
    assert_eq!(settled, Some(json!("payload")));
}
