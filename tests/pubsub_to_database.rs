use chrono::{SecondsFormat, Utc};
use firebase_functions::admin::{Database, PubSub};
use firebase_functions::completion::Completion;
use firebase_functions::pubsub::{self, Message};
use firebase_functions::registry::Registry;
use firebase_functions::server;
use httpmock::Method::{POST, PUT};
use httpmock::MockServer;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const POLL_ATTEMPTS: usize = 50;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Deserialize)]
struct Payload {
    payload: String,
}

#[tokio::test]
async fn published_payload_lands_in_database() {
    let backend = MockServer::start_async().await;
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let published = backend
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/topics/events:publish");
            then.status(200).json_body(json!({ "messageIds": ["1"] }));
        })
        .await;
    let stored = backend
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/messages/latest.json")
                .json_body(json!(timestamp));
            then.status(204);
        })
        .await;

    let client = || ClientBuilder::new(Client::new()).build();
    let database = Database::new_with_client(client(), &backend.url(""), None);

    let mut registry = Registry::new();
    registry
        .register(
            "onEvent",
            pubsub::topic("events").on_publish(move |message, _ctx| {
                let database = database.clone();
                Completion::pending(async move {
                    let body: Payload = message.json()?;
                    database.reference("messages/latest").set(&body.payload).await?;
                    Ok::<_, anyhow::Error>(())
                })
            }),
        )
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let runtime = tokio::spawn(server::run(listener, Arc::new(registry), None, async move {
        let _ = stopped.await;
    }));

    let pubsub = PubSub::new_with_client(client(), &backend.url("/v1"), "demo");
    let message_id = pubsub
        .topic("events")
        .publish_json(&json!({ "payload": timestamp }))
        .await
        .unwrap();
    published.assert_async().await;

    // Deliver the message the way the runtime would, without waiting for the result.
    let mut delivered = Message::from_json(&json!({ "payload": timestamp })).unwrap();
    delivered.message_id = Some(message_id);
    let envelope = json!({
        "data": delivered,
        "context": {
            "eventId": "1",
            "timestamp": timestamp,
            "eventType": "google.pubsub.topic.publish",
            "resource": "projects/demo/topics/events"
        }
    });
    let url = format!("http://{}/onEvent", addr);
    let delivery = tokio::spawn(async move { Client::new().post(url).json(&envelope).send().await });

    let mut landed = false;
    for _ in 0..POLL_ATTEMPTS {
        if stored.hits_async().await >= 1 {
            landed = true;
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    assert!(landed, "payload never reached the database");

    let response = delivery.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);

    stop.send(()).unwrap();
    runtime.await.unwrap();
}
