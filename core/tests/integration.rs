//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `SnipcartClient`
//! through the default `UreqTransport` over real HTTP, checking that what the
//! builder encodes is what the server receives.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use snipcart_core::{ApiError, ClientConfig, PostEncoding, RequestOptions, ResponseBody, SnipcartClient};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> SnipcartClient {
    SnipcartClient::with_config(ClientConfig::new("test_key").with_base_url(format!("http://{addr}/api/")))
}

fn json_body(body: &ResponseBody) -> &serde_json::Value {
    body.as_json().expect("expected a json body")
}

#[test]
fn get_with_payload_reaches_server_as_query() {
    let addr = start_server();
    let mut snipcart = client(addr);

    let body = snipcart
        .get()
        .from("/orders/")
        .payload(json!({"status": "Processed", "limit": 1}))
        .send()
        .unwrap()
        .clone();

    assert_eq!(snipcart.status_code(), 200);
    assert!(snipcart.successful());
    let body = json_body(&body);
    assert_eq!(body["query"], "status=Processed&limit=1");
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[test]
fn raw_query_is_sent_verbatim() {
    let addr = start_server();
    let mut snipcart = client(addr);

    let body = snipcart.get().to("echo").raw_payload("a=1&b=2").send().unwrap().clone();

    assert_eq!(json_body(&body)["query"], "a=1&b=2");
    assert_eq!(json_body(&body)["method"], "GET");
}

#[test]
fn order_lifecycle() {
    let addr = start_server();
    let mut snipcart = client(addr);

    // Step 1: fetch an order.
    let body = snipcart.get().to("orders/ord-1001").send().unwrap().clone();
    assert!(snipcart.successful());
    assert_eq!(json_body(&body)["status"], "Processed");

    // Step 2: ship it with a JSON body.
    let body = snipcart
        .put()
        .to("orders/ord-1001")
        .payload(json!({"status": "Shipped", "trackingNumber": "1Z999"}))
        .send()
        .unwrap()
        .clone();
    assert_eq!(snipcart.status_code(), 200);
    assert_eq!(json_body(&body)["status"], "Shipped");
    assert_eq!(json_body(&body)["trackingNumber"], "1Z999");

    // Step 3: read it back.
    let body = snipcart.get().to("orders/ord-1001").payload(json!({})).send().unwrap().clone();
    assert_eq!(json_body(&body)["trackingNumber"], "1Z999");

    // Step 4: an unknown order is a completed request, not an error.
    let body = snipcart.get().to("orders/nope").send().unwrap().clone();
    assert_eq!(snipcart.status_code(), 404);
    assert!(!snipcart.successful());
    assert!(json_body(&body)["message"].is_string());
}

#[test]
fn discount_lifecycle_with_form_encoding() {
    let addr = start_server();
    let mut snipcart = client(addr);

    // Step 1: create with a form body.
    let body = snipcart
        .post()
        .to("discounts")
        .post_encoding(PostEncoding::Form)
        .payload(vec![("name", "Spring Sale"), ("code", "SPRING"), ("rate", "15")])
        .send()
        .unwrap()
        .clone();
    assert_eq!(snipcart.status_code(), 201);
    let body = json_body(&body);
    assert_eq!(body["name"], "Spring Sale");
    let id = body["id"].as_str().unwrap().to_string();

    // Step 2: delete it; the empty 204 body comes back as raw text.
    let body = snipcart
        .delete()
        .to(format!("discounts/{id}"))
        .payload(json!({}))
        .send()
        .unwrap()
        .clone();
    assert_eq!(snipcart.status_code(), 204);
    assert!(snipcart.successful());
    assert_eq!(body, ResponseBody::Raw(String::new()));

    // Step 3: deleting again is a 404.
    snipcart.send().unwrap();
    assert_eq!(snipcart.status_code(), 404);
}

#[test]
fn json_and_form_bodies_as_received() {
    let addr = start_server();
    let mut snipcart = client(addr);

    let body = snipcart
        .patch()
        .to("echo")
        .payload(json!({"note": "a b", "qty": 2}))
        .send()
        .unwrap()
        .clone();
    assert_eq!(json_body(&body)["method"], "PATCH");
    assert_eq!(json_body(&body)["contentType"], "application/json");
    assert_eq!(json_body(&body)["body"], r#"{"note":"a b","qty":2}"#);

    let body = snipcart.post_encoding(PostEncoding::Form).send().unwrap().clone();
    assert_eq!(json_body(&body)["contentType"], "application/x-www-form-urlencoded");
    assert_eq!(json_body(&body)["body"], "note=a+b&qty=2");
}

#[test]
fn missing_api_key_is_a_401_response() {
    let addr = start_server();
    let mut snipcart = client(addr);

    snipcart.api_key("").to("orders").send().unwrap();
    assert_eq!(snipcart.status_code(), 401);
    assert!(!snipcart.successful());

    snipcart.api_key("test_key").send().unwrap();
    assert_eq!(snipcart.status_code(), 200);
}

#[test]
fn plain_text_body_falls_back_to_raw() {
    let addr = start_server();
    let mut snipcart = client(addr);

    let body = snipcart.to("ping").send().unwrap().clone();
    assert_eq!(body, ResponseBody::Raw("pong".to_string()));
    assert!(snipcart.successful());
}

#[test]
fn connection_failure_is_an_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut snipcart =
        SnipcartClient::with_config(ClientConfig::new("test_key").with_base_url(format!("http://127.0.0.1:{port}/api")));
    snipcart.request_options(RequestOptions::new().timeout(Duration::from_secs(5)));

    let err = snipcart.to("orders").send().unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(snipcart.status_code(), 0);
    assert!(snipcart.response().is_none());
}
