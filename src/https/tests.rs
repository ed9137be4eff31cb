use super::*;
use serde_json::json;

fn request(uri: &str, body: &'static str) -> Request<Bytes> {
    let mut request = Request::new(Bytes::from_static(body.as_bytes()));
    *request.uri_mut() = uri.parse().unwrap();
    request
}

#[tokio::test]
async fn test_handler_receives_request() {
    let function = on_request(|req: Request<Bytes>| async move {
        let body = String::from_utf8(req.body().to_vec()).unwrap();
        json_response(StatusCode::CREATED, &json!({ "path": req.uri().path(), "body": body }))
    });

    let response = function.call(request("/orders?id=1", "hello")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body, json!({ "path": "/orders", "body": "hello" }));
}

#[tokio::test]
async fn test_handler_error_becomes_500() {
    let function = on_request(|_req: Request<Bytes>| async move {
        Err::<Response<Bytes>, _>(anyhow::anyhow!("database unavailable"))
    });

    let response = function.call(request("/", "")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body().as_ref(), b"database unavailable");
}

#[tokio::test]
async fn test_plain_return_types() {
    let text = on_request(|_req: Request<Bytes>| async { "ok" });
    let response = text.call(request("/", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"ok");

    let status = on_request(|_req: Request<Bytes>| async { StatusCode::NO_CONTENT });
    let response = status.call(request("/", "")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.body().is_empty());
}

#[test]
fn test_options_are_attached() {
    let function = crate::options::region(&["europe-west1"])
        .unwrap()
        .https_on_request(|_req: Request<Bytes>| async { StatusCode::OK });
    assert_eq!(function.options().regions, vec!["europe-west1".to_string()]);
    assert!(format!("{:?}", function).starts_with("HttpsFunction"));
}
