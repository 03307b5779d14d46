//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background runtime, then
//! drives the blocking client over real HTTP. The `/echo` route reports what
//! actually went over the wire, so assertions check the encoded query, body,
//! and headers rather than the client's own view of them.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use mock_server::Echo;
use requests_core::{
    params, Client, ClientConfig, ContentType, HttpMethod, ParamMap, Request, RequestError,
};

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

fn client() -> Client {
    Client::new(ClientConfig::default())
}

#[test]
fn get_sends_params_in_query_without_body() {
    let addr = start_server();
    let resp = client()
        .fast_get(
            &format!("http://{addr}/echo"),
            params! { "q" => "hello world", "page" => 2, "f" => params! { "lang" => "en" } },
        )
        .unwrap();

    assert_eq!(resp.status, 200);
    let echo: Echo = resp.json().unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("f%5Blang%5D=en&page=2&q=hello+world"));
    assert!(echo.body.is_empty());
}

#[test]
fn post_form_sends_encoded_body() {
    let addr = start_server();
    let resp = client()
        .post_form(&format!("http://{addr}/echo"), params! { "k" => "v" }, None, None)
        .unwrap();

    let echo: Echo = resp.json().unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "k=v");
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
}

#[test]
fn post_json_sends_json_body() {
    let addr = start_server();
    let resp = client()
        .post_json(&format!("http://{addr}/echo"), params! { "n" => 3 }, None, None)
        .unwrap();

    let echo: Echo = resp.json().unwrap();
    assert_eq!(echo.body, r#"{"n":3}"#);
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/json;charset=utf-8")
    );
}

#[test]
fn convenience_post_overrides_only_content_type() {
    let addr = start_server();
    let headers = vec![
        ("Content-Type".to_string(), "text/plain".to_string()),
        ("X-Trace".to_string(), "abc".to_string()),
    ];
    let resp = client()
        .post_json(&format!("http://{addr}/echo"), params! {}, Some(headers), None)
        .unwrap();

    let echo: Echo = resp.json().unwrap();
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/json;charset=utf-8")
    );
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("abc"));
}

#[test]
fn auto_routes_by_method_and_content_type() {
    let addr = start_server();
    let url = format!("http://{addr}/echo");
    let c = client();

    let get = c
        .auto(HttpMethod::Get, ContentType::Json, &url, params! { "a" => 1 }, None, None)
        .unwrap();
    let echo: Echo = c.read(get).unwrap().json().unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("a=1"));

    let form = c
        .auto(HttpMethod::Post, ContentType::Form, &url, params! { "a" => 1 }, None, None)
        .unwrap();
    let echo: Echo = c.read(form).unwrap().json().unwrap();
    assert_eq!(echo.body, "a=1");

    let json = c
        .auto(HttpMethod::Post, ContentType::Json, &url, params! { "a" => 1 }, None, None)
        .unwrap();
    let echo: Echo = c.read(json).unwrap().json().unwrap();
    assert_eq!(echo.body, r#"{"a":1}"#);
}

#[test]
fn execute_sends_prebuilt_request_headers_verbatim() {
    let addr = start_server();
    let request = Request::new(
        HttpMethod::Post,
        ContentType::Form,
        &format!("http://{addr}/echo"),
        params! { "x" => "1" },
        vec![("X-Custom".to_string(), "yes".to_string())],
        None,
    )
    .unwrap();

    let echo: Echo = client().execute(&request).unwrap().json().unwrap();
    assert_eq!(echo.body, "x=1");
    assert_eq!(echo.headers.get("x-custom").map(String::as_str), Some("yes"));
}

#[test]
fn error_status_is_returned_as_data() {
    let addr = start_server();
    let resp = client()
        .fast_get(&format!("http://{addr}/status/404"), ParamMap::new())
        .unwrap();

    assert_eq!(resp.status, 404);
    assert!(!resp.is_success());
    assert_eq!(resp.text(), "status 404");
}

#[test]
fn raw_response_exposes_status_before_read() {
    let addr = start_server();
    let c = client();
    let raw = c.get(&format!("http://{addr}/status/201"), ParamMap::new()).unwrap();
    assert_eq!(raw.status(), 201);
    let resp = c.read(raw).unwrap();
    assert_eq!(resp.body, b"status 201");
}

#[test]
fn body_over_limit_is_a_read_error() {
    let addr = start_server();
    let c = Client::new(ClientConfig {
        max_body_size: 16,
        ..ClientConfig::default()
    });

    let err = c
        .fast_get(&format!("http://{addr}/bytes/1024"), ParamMap::new())
        .unwrap_err();
    assert!(matches!(err, RequestError::Read(_)));

    let ok = c.fast_get(&format!("http://{addr}/bytes/16"), ParamMap::new()).unwrap();
    assert_eq!(ok.body.len(), 16);
}

#[test]
fn per_call_timeout_is_a_transport_error() {
    let addr = start_server();
    let request = client()
        .request(HttpMethod::Get, &format!("http://{addr}/slow/3000"))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let started = Instant::now();
    let err = client().execute(&request).unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn unreachable_host_fails_without_partial_result() {
    let c = Client::new(ClientConfig {
        connect_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    });
    let err = c
        .post_json("http://127.0.0.1:1/echo", params! { "n" => 1 }, None, None)
        .unwrap_err();
    assert!(matches!(err, RequestError::Transport(_)));
}

#[test]
fn requests_over_host_limit_queue_instead_of_failing() {
    let addr = start_server();
    let c = Client::new(ClientConfig {
        max_connections_per_host: 1,
        ..ClientConfig::default()
    });
    let url = format!("http://{addr}/slow/150");

    let started = Instant::now();
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let c = c.clone();
            let url = url.clone();
            std::thread::spawn(move || c.fast_get(&url, ParamMap::new()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap().status, 200);
    }
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[test]
fn free_functions_use_the_shared_client() {
    let addr = start_server();
    let url = format!("http://{addr}/echo");

    let echo: Echo = requests_core::fast_get(&url, params! { "q" => "v" })
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(echo.query.as_deref(), Some("q=v"));

    let echo: Echo = requests_core::post_json(&url, params! { "n" => 3 }, None, None)
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(echo.body, r#"{"n":3}"#);

    let raw = requests_core::auto(
        HttpMethod::Post,
        ContentType::Form,
        &url,
        params! { "k" => "v" },
        None,
        None,
    )
    .unwrap();
    let echo: Echo = Client::shared().read(raw).unwrap().json().unwrap();
    assert_eq!(echo.body, "k=v");
}
