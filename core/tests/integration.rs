//! End-to-end dispatch against the live mock server.
//!
//! # Design
//! Starts the echo server on a random port, then drives requests through
//! `Client` over real HTTP with the default `ureq` transport. The server
//! reflects what it received, so assertions check the wire, not the builder.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use courier_core::{
    ClientConfig, Client, Error, Method, MethodOverride, RawResponse, RequestContext,
    RequestIdContext, TracingWireLog, WireLog, WireRequest,
};
use mock_server::Echo;
use serde_json::json;

fn spawn_server() -> SocketAddr {
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

#[test]
fn get_merges_query_and_sends_no_body() {
    let addr = spawn_server();
    let client = Client::new(&format!("http://{addr}/")).unwrap();

    let request = client
        .request()
        .with_query([("foo", "bar")])
        .with_query([("bar", "baz")])
        .with_body([("ignored", "1")])
        .with_method(Method::Get);
    let echo: Echo = client.call_as(&request).unwrap();

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/");
    assert_eq!(echo.query["foo"], "bar");
    assert_eq!(echo.query["bar"], "baz");
    assert!(echo.body.is_none());
    assert_eq!(echo.headers["accept"], "application/json");
    assert_eq!(echo.headers["content-type"], "application/json; charset=utf-8");
}

#[test]
fn post_sends_json_body_and_custom_headers() {
    let addr = spawn_server();
    let client = Client::new(&format!("http://{addr}/v1")).unwrap();

    let request = client
        .request()
        .with_path(["users", "1/sms"])
        .with_headers([("X-Trace", "t-1")])
        .with_body([("text", "hello")])
        .with_method(Method::Post);
    let echo: Echo = client.call_as(&request).unwrap();

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/v1/users/1/sms");
    assert_eq!(echo.headers["x-trace"], "t-1");
    assert_eq!(echo.body, Some(json!({"text": "hello"})));
}

#[test]
fn patch_is_tunneled_through_post() {
    let addr = spawn_server();
    let client = Client::new(&format!("http://{addr}")).unwrap();

    let request = client
        .request()
        .with_path(["users/1"])
        .with_body([("name", "Ann")])
        .with_method(Method::Patch);
    let echo: Echo = client.call_as(&request).unwrap();

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, Some(json!({"name": "Ann", "_method": "patch"})));
}

#[test]
fn native_override_sends_real_verbs() {
    let addr = spawn_server();
    let mut config = ClientConfig::new(format!("http://{addr}"));
    config.method_override = MethodOverride::Native;
    let client = Client::from_config(&config).unwrap();

    let patch = client
        .request()
        .with_body([("name", "Ann")])
        .with_method(Method::Patch);
    let echo: Echo = client.call_as(&patch).unwrap();
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.body, Some(json!({"name": "Ann"})));

    let delete = client.request().with_path(["users", "1"]).with_method(Method::Delete);
    let echo: Echo = client.call_as(&delete).unwrap();
    assert_eq!(echo.method, "DELETE");
    assert!(echo.body.is_none());
}

#[test]
fn request_id_comes_from_the_context() {
    let addr = spawn_server();
    let ids = RequestIdContext::new();
    let client = Client::new(&format!("http://{addr}"))
        .unwrap()
        .with_context(RequestContext::new().with_request_id(ids.clone()));

    ids.set("corr-42");
    let echo: Echo = client.call_as(&client.request().with_method(Method::Get)).unwrap();
    assert_eq!(echo.headers["x-request-id"], "corr-42");

    ids.clear();
    let echo: Echo = client.call_as(&client.request().with_method(Method::Get)).unwrap();
    assert!(!echo.headers.contains_key("x-request-id"));
}

#[test]
fn error_status_becomes_response_error() {
    let addr = spawn_server();
    let client = Client::new(&format!("http://{addr}")).unwrap();
    let request = client.request().with_path(["status", "404"]).with_method(Method::Get);

    let err = client.call(&request).unwrap_err();
    assert!(matches!(err, Error::Response { .. }));
    assert_eq!(err.status(), Some(404));
    let reply: Echo = serde_json::from_str(&err.response().unwrap().body).unwrap();
    assert_eq!(reply.path, "/status/404");
    assert_eq!(err.dispatch().unwrap().path, format!("http://{addr}/status/404"));
}

#[test]
fn error_handler_replaces_the_failure() {
    let addr = spawn_server();
    let client = Client::new(&format!("http://{addr}"))
        .unwrap()
        .with_logger(Arc::new(TracingWireLog));
    let request = client.request().with_path(["status", "500"]).with_method(Method::Post);

    let value = client
        .call_with(&request, |reply| json!({"status": reply.status}))
        .unwrap();
    assert_eq!(value, json!({"status": 500}));
}

#[test]
fn transport_opens_on_first_dispatch_and_is_reused() {
    let addr = spawn_server();
    let client = Client::new(&format!("http://{addr}")).unwrap();
    assert!(!client.adapter().transport().is_connected());

    let request = client.request().with_method(Method::Get);
    client.call(&request).unwrap();
    assert!(client.adapter().transport().is_connected());
    client.call(&request).unwrap();

    let journal: Vec<Echo> = client
        .call_as(&client.request().with_path(["__journal"]).with_method(Method::Get))
        .unwrap();
    assert_eq!(journal.len(), 2);
}

#[test]
fn one_client_dispatches_from_several_threads() {
    let addr = spawn_server();
    let client = Arc::new(Client::new(&format!("http://{addr}")).unwrap());

    let handles: Vec<_> = (0..2)
        .map(|n| {
            let client = Arc::clone(&client);
            std::thread::spawn(move || {
                let request = client
                    .request()
                    .with_query([("n", n.to_string())])
                    .with_method(Method::Get);
                let echo: Echo = client.call_as(&request).unwrap();
                assert_eq!(echo.query["n"], n.to_string());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(client.adapter().transport().is_connected());
    let journal: Vec<Echo> = client
        .call_as(&client.request().with_path(["__journal"]).with_method(Method::Get))
        .unwrap();
    assert_eq!(journal.len(), 2);
}

#[test]
fn connection_refused_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = Client::new(&format!("http://{addr}")).unwrap();

    let err = client.call(&client.request().with_method(Method::Get)).unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[derive(Default)]
struct RecordingLog {
    events: Mutex<Vec<String>>,
}

impl WireLog for RecordingLog {
    fn write(&self, request: &WireRequest) {
        self.events.lock().unwrap().push(format!("write {}", request.method));
    }

    fn read(&self, response: &RawResponse) {
        self.events.lock().unwrap().push(format!("read {}", response.status));
    }
}

#[test]
fn wire_activity_reaches_the_logger() {
    let addr = spawn_server();
    let log = Arc::new(RecordingLog::default());
    let client = Client::new(&format!("http://{addr}"))
        .unwrap()
        .with_logger(log.clone());

    client.call(&client.request().with_method(Method::Delete)).unwrap();

    let events = log.events.lock().unwrap();
    assert_eq!(*events, vec!["write POST".to_string(), "read 200".to_string()]);
}
