//! Agent tests against a one-shot local HTTP server.

use hey_core::completion::{CompletionClient, CompletionRequest};
use hey_core::error::HeyError;
use hey_core::message::Message;
use hey_interaction::{ApiConfig, OpenAIApiAgent};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves exactly one request with the given status line, content type and
/// body, then closes the connection. Resolves to the raw request text.
async fn serve_once(status: &'static str, content_type: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\nconnection: close\r\n\r\n{body}"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn agent(base_url: String) -> OpenAIApiAgent {
    OpenAIApiAgent::new(ApiConfig::new("sk-test", base_url))
}

fn request() -> CompletionRequest {
    CompletionRequest::new("gpt-4o", vec![Message::system("sys"), Message::user("hi")])
        .with_temperature(0.7)
        .with_max_tokens(64)
}

#[tokio::test]
async fn batch_completion_returns_first_choice() {
    let (base_url, server) = serve_once(
        "200 OK",
        "application/json",
        r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#.to_string(),
    )
    .await;

    let text = agent(base_url).complete(&request()).await.unwrap();
    assert_eq!(text, "Hi there");

    let raw_request = server.await.unwrap();
    assert!(raw_request.starts_with("POST /v1/chat/completions"));
    assert!(raw_request.to_lowercase().contains("authorization: bearer sk-test"));
    let body = &raw_request[raw_request.find("\r\n\r\n").unwrap() + 4..];
    let body: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_tokens"], 64);
    assert_eq!(body["messages"][1]["content"], "hi");
    assert!(body.get("stream").is_none());
}

#[tokio::test]
async fn batch_non_json_body_is_parse_error() {
    let (base_url, _server) =
        serve_once("200 OK", "text/html", "<html>gateway</html>".to_string()).await;

    let err = agent(base_url).complete(&request()).await.unwrap_err();
    match err {
        HeyError::Parse { body, .. } => assert_eq!(body, "<html>gateway</html>"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn batch_wrong_shape_is_schema_error() {
    let (base_url, _server) =
        serve_once("200 OK", "application/json", r#"{"object":"list"}"#.to_string()).await;

    let err = agent(base_url).complete(&request()).await.unwrap_err();
    assert!(err.is_schema());
}

#[tokio::test]
async fn error_status_is_transport_error() {
    let (base_url, _server) = serve_once(
        "429 Too Many Requests",
        "application/json",
        r#"{"error":{"message":"Rate limit reached"}}"#.to_string(),
    )
    .await;

    let err = agent(base_url).complete(&request()).await.unwrap_err();
    assert_eq!(
        err,
        HeyError::transport(Some(429), r#"{"error":{"message":"Rate limit reached"}}"#)
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = agent(format!("http://{addr}/v1"))
        .complete(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, HeyError::Transport { status: None, .. }));
}

#[tokio::test]
async fn streaming_forwards_deltas_in_order() {
    let body = [
        r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
        "",
        "data: [DONE]",
        "",
    ]
    .join("\n");
    let (base_url, server) = serve_once("200 OK", "text/event-stream", body).await;

    let mut seen = Vec::new();
    let text = {
        let mut sink = |delta: &str| seen.push(delta.to_string());
        agent(base_url)
            .complete_streaming(&request(), &mut sink)
            .await
            .unwrap()
    };
    assert_eq!(text, "Hello");
    assert_eq!(seen, vec!["Hel", "lo"]);

    let raw_request = server.await.unwrap();
    assert!(raw_request.contains(r#""stream":true"#));
}

#[tokio::test]
async fn streaming_error_status_is_not_parsed_as_events() {
    let (base_url, _server) = serve_once(
        "500 Internal Server Error",
        "text/event-stream",
        "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n".to_string(),
    )
    .await;

    let mut seen: Vec<String> = Vec::new();
    let err = {
        let mut sink = |delta: &str| seen.push(delta.to_string());
        agent(base_url)
            .complete_streaming(&request(), &mut sink)
            .await
            .unwrap_err()
    };
    assert!(matches!(err, HeyError::Transport { status: Some(500), .. }));
    assert!(seen.is_empty());
}

#[tokio::test]
async fn streaming_bad_line_is_parse_error() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: nope\n\n".to_string();
    let (base_url, _server) = serve_once("200 OK", "text/event-stream", body).await;

    let mut sink = |_: &str| {};
    let err = agent(base_url)
        .complete_streaming(&request(), &mut sink)
        .await
        .unwrap_err();
    assert!(err.is_parse());
}

#[tokio::test]
async fn list_models_keeps_gpt_ids() {
    let (base_url, server) = serve_once(
        "200 OK",
        "application/json",
        r#"{"data":[{"id":"whisper-1"},{"id":"gpt-4o"},{"id":"gpt-4o-mini"},{"id":"dall-e-3"}]}"#
            .to_string(),
    )
    .await;

    let models = agent(base_url).list_models().await.unwrap();
    assert_eq!(models, vec!["gpt-4o", "gpt-4o-mini"]);
    assert!(server.await.unwrap().starts_with("GET /v1/models"));
}
