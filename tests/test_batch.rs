use mockito::{Matcher, Server};
use paper_metadata::{BatchItem, Credentials, ErrorKind, MetadataGateway, Provider};

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("first paper".to_string()))
        .with_status(200)
        .with_body(
            r#"{"choices":[{"message":{"content":"{\"title\":\"First\",\"authors\":\"A. Author\",\"year\":\"2019\",\"keywords\":\"x\"}"}}]}"#,
        )
        .create_async()
        .await;
    let garbled = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("third paper".to_string()))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"Sorry, no idea."}}]}"#)
        .create_async()
        .await;

    let gateway = MetadataGateway::builder()
        .base_url(Provider::OpenAI, server.url())
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::OpenAI, "sk-openai");

    let items = vec![
        BatchItem::new("first.pdf", "first paper"),
        BatchItem::new("second.pdf", ""),
        BatchItem::new("third.pdf", "third paper"),
    ];

    let entries = gateway
        .extract_batch(&items, "gpt4o-mini", &credentials, None)
        .await;

    let names: Vec<&str> = entries.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(names, ["first.pdf", "second.pdf", "third.pdf"]);

    assert!(entries[0].success);
    assert_eq!(entries[0].metadata.as_ref().unwrap().title, "First");
    assert!(entries[0].error.is_none());

    assert!(!entries[1].success);
    assert_eq!(entries[1].error_kind, Some(ErrorKind::InvalidInput));

    assert!(!entries[2].success);
    assert_eq!(entries[2].error_kind, Some(ErrorKind::MalformedResponse));
    assert!(entries[2].error.as_ref().unwrap().contains("Sorry, no idea."));

    ok.assert_async().await;
    garbled.assert_async().await;
}

#[tokio::test]
async fn test_empty_batch() {
    let gateway = MetadataGateway::new();
    let entries = gateway
        .extract_batch(&[], "sonnet", &Credentials::new(), None)
        .await;
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_failed_entries_do_not_expose_api_keys() {
    let gateway = MetadataGateway::builder()
        .base_url(Provider::Google, "http://127.0.0.1:9")
        .build()
        .unwrap();
    let credentials = Credentials::new().with(Provider::Google, "SECRET-GOOGLE-KEY");
    let items = vec![BatchItem::new("paper.pdf", "article text")];

    let entries = gateway
        .extract_batch(&items, "gemini-2.0-flash", &credentials, None)
        .await;

    assert_eq!(entries[0].error_kind, Some(ErrorKind::TransportError));
    let json = serde_json::to_string(&entries[0]).unwrap();
    assert!(!json.contains("SECRET-GOOGLE-KEY"));
}
