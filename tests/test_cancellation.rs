use mockito::Server;
use paper_metadata::{Credentials, ExtractionError, MetadataGateway, Provider};
use std::net::TcpListener;
use std::time::Duration;

const RESPONSE: &str = r#"{"content":[{"text":"{\"title\":\"A\",\"authors\":\"B\",\"year\":\"2020\",\"keywords\":\"C\"}"}]}"#;

#[tokio::test]
async fn test_already_cancelled_returns_cancelled() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(RESPONSE)
        .create_async()
        .await;

    let gateway = MetadataGateway::builder()
        .base_url(Provider::Anthropic, server.url())
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::Anthropic, "sk-ant");

    let err = gateway
        .extract_with_cancel("article", "sonnet", &credentials, None, std::future::ready(()))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Cancelled));
}

#[tokio::test]
async fn test_uncancelled_call_completes() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(RESPONSE)
        .create_async()
        .await;

    let gateway = MetadataGateway::builder()
        .base_url(Provider::Anthropic, server.url())
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::Anthropic, "sk-ant");

    let extraction = gateway
        .extract_with_cancel(
            "article",
            "sonnet",
            &credentials,
            None,
            tokio::time::sleep(Duration::from_secs(30)),
        )
        .await
        .unwrap();

    assert_eq!(extraction.record.title, "A");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_preconditions_win_over_cancellation() {
    let gateway = MetadataGateway::new();

    let err = gateway
        .extract_with_cancel("", "sonnet", &Credentials::new(), None, std::future::ready(()))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::InvalidInput(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let gateway = MetadataGateway::builder()
        .base_url(Provider::DeepSeek, "http://127.0.0.1:9")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::DeepSeek, "ds-key");

    let err = gateway
        .extract("article", "deepseek", &credentials, None)
        .await
        .unwrap_err();

    match err {
        ExtractionError::TransportError { provider, .. } => assert_eq!(provider, Provider::DeepSeek),
        other => panic!("Expected TransportError, got {:?}", other),
    }
}

/// Listener that completes the TCP handshake but never answers
fn silent_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

#[tokio::test]
async fn test_client_timeout_is_a_transport_error() {
    let (_listener, url) = silent_server();
    let gateway = MetadataGateway::builder()
        .base_url(Provider::OpenAI, url)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::OpenAI, "sk-openai");

    let err = gateway
        .extract("article", "gpt4o-mini", &credentials, None)
        .await
        .unwrap_err();

    match err {
        ExtractionError::TransportError { provider, source } => {
            assert_eq!(provider, Provider::OpenAI);
            assert!(source.is_timeout());
        }
        other => panic!("Expected TransportError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_while_request_is_in_flight() {
    let (_listener, url) = silent_server();
    let gateway = MetadataGateway::builder()
        .base_url(Provider::Google, url)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::Google, "google-key");

    let started = std::time::Instant::now();
    let err = gateway
        .extract_with_cancel(
            "article",
            "gemini-2.5-pro",
            &credentials,
            None,
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(30));
}
