//! Binding derived client instances.

use call_logger::{attach_with, ClientDefaults, DefaultConnector, LoggerConfig};
use serde_json::{json, Value};

mod common;

fn paths(connector: &DefaultConnector) -> Vec<String> {
    connector
        .memory_sink("test")
        .memory_collection("logs")
        .documents()
        .into_iter()
        .map(|(_, doc)| doc["request"]["path"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn base(addr: std::net::SocketAddr) -> ClientDefaults {
    ClientDefaults::default().base_url(format!("http://{}", addr))
}

#[tokio::test]
async fn test_derived_instances_bound_when_propagating() {
    let addr = common::start_json_backend(200, r#"{"x":"y"}"#).await;
    let connector = DefaultConnector::new();
    let mut parent = common::client(ClientDefaults::default());
    let config = LoggerConfig::new("memory://test", "logs").propagate_to_derived(true);
    attach_with(&mut parent, config, &connector).await.unwrap();

    let derived = parent.create(base(addr));
    assert_eq!(derived.request_interceptor_count(), 1);
    assert_eq!(derived.response_interceptor_count(), 1);

    parent.get(format!("http://{}/parent", addr)).await.unwrap();
    let response = derived.get("/path").await.unwrap();
    assert_eq!(response.data, json!({"x": "y"}));

    assert_eq!(paths(&connector), vec!["/parent".to_string(), "/path".to_string()]);
}

#[tokio::test]
async fn test_derived_instances_ignored_by_default() {
    let addr = common::start_json_backend(200, "{}").await;
    let connector = DefaultConnector::new();
    let mut parent = common::client(ClientDefaults::default());
    attach_with(&mut parent, LoggerConfig::new("memory://test", "logs"), &connector)
        .await
        .unwrap();

    let derived = parent.create(base(addr));
    assert_eq!(derived.request_interceptor_count(), 0);

    derived.get("/derived").await.unwrap();
    parent.get(format!("http://{}/parent", addr)).await.unwrap();

    assert_eq!(paths(&connector), vec!["/parent".to_string()]);
}

#[tokio::test]
async fn test_propagation_is_one_level() {
    let addr = common::start_json_backend(200, "{}").await;
    let connector = DefaultConnector::new();
    let mut parent = common::client(ClientDefaults::default());
    let config = LoggerConfig::new("memory://test", "logs").propagate_to_derived(true);
    attach_with(&mut parent, config, &connector).await.unwrap();

    let child = parent.create(base(addr));
    let grandchild = child.create(ClientDefaults::default());

    child.get("/child").await.unwrap();
    grandchild.get("/grandchild").await.unwrap();

    assert_eq!(paths(&connector), vec!["/child".to_string()]);
}

#[tokio::test]
async fn test_derived_binding_shares_transforms() {
    let addr = common::start_json_backend(200, "{}").await;
    let connector = DefaultConnector::new();
    let mut parent = common::client(ClientDefaults::default());
    let config = LoggerConfig::new("memory://test", "logs")
        .propagate_to_derived(true)
        .with_request_transform(|mut body: Value, _| {
            body["redacted"] = json!(true);
            body
        });
    attach_with(&mut parent, config, &connector).await.unwrap();

    let derived = parent.create(base(addr));
    derived.post_json("/login", &json!({"user": "ada"})).await.unwrap();

    let docs = connector.memory_sink("test").memory_collection("logs").documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].1["request"]["body"], json!({"user": "ada", "redacted": true}));
}

#[tokio::test]
async fn test_each_derivation_bound_once() {
    let addr = common::start_json_backend(200, "{}").await;
    let connector = DefaultConnector::new();
    let mut parent = common::client(ClientDefaults::default());
    let config = LoggerConfig::new("memory://test", "logs").propagate_to_derived(true);
    attach_with(&mut parent, config, &connector).await.unwrap();

    let first = parent.create(base(addr));
    let second = parent.create(base(addr));
    first.get("/first").await.unwrap();
    second.get("/second").await.unwrap();

    assert_eq!(first.response_interceptor_count(), 1);
    assert_eq!(paths(&connector), vec!["/first".to_string(), "/second".to_string()]);
}
