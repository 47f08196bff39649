use foundry_llm::azure_openai::AzureOpenAIClient;
use foundry_llm::{ChatClient, ChatRequest, Credential, Message, StaticTokenCredential};
use mockito::Matcher;
use serde_json::json;

const COMPLETION_BODY: &str = r#"{
    "id": "chatcmpl-1",
    "object": "chat.completion",
    "created": 1700000000,
    "model": "gpt-4o-2024-08-06",
    "choices": [
        {"index": 0, "message": {"role": "assistant", "content": "A retro arcade game."}, "finish_reason": "stop"}
    ],
    "usage": {"prompt_tokens": 21, "completion_tokens": 6, "total_tokens": 27}
}"#;

#[test]
fn test_azure_client_builder_success() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint("https://test-resource.openai.azure.com/")
        .api_version("2024-10-21")
        .build();

    let client = result.unwrap();
    assert_eq!(client.endpoint(), "https://test-resource.openai.azure.com");
    assert_eq!(
        client.build_url("gpt-4o", "chat/completions"),
        "https://test-resource.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-10-21"
    );
}

#[test]
fn test_azure_client_builder_missing_credential() {
    let result = AzureOpenAIClient::builder()
        .endpoint("https://test-resource.openai.azure.com")
        .api_version("2024-10-21")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("Credential"));
}

#[test]
fn test_azure_client_builder_missing_endpoint() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .api_version("2024-10-21")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("Endpoint"));
}

#[test]
fn test_azure_client_builder_missing_api_version() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint("https://test-resource.openai.azure.com")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("API version"));
}

#[tokio::test]
async fn test_chat_with_api_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
        .match_query(Matcher::UrlEncoded("api-version".into(), "2024-10-21".into()))
        .match_header("api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "What is Azure Frogger?"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COMPLETION_BODY)
        .create_async()
        .await;

    let client = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint(server.url())
        .api_version("2024-10-21")
        .build()
        .unwrap();

    let request = ChatRequest::new(
        "gpt-4o",
        vec![
            Message::system("You are a helpful assistant."),
            Message::human("What is Azure Frogger?"),
        ],
    );
    let response = client.chat(request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.role, "assistant");
    assert_eq!(response.content.as_deref(), Some("A retro arcade game."));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 27);
}

#[tokio::test]
async fn test_chat_with_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer token-abc")
        .with_status(200)
        .with_body(COMPLETION_BODY)
        .create_async()
        .await;

    let client = AzureOpenAIClient::builder()
        .credential(Credential::token(StaticTokenCredential::new("token-abc")))
        .endpoint(server.url())
        .api_version("2024-10-21")
        .build()
        .unwrap();

    client
        .chat(ChatRequest::new("gpt-4o", vec![Message::human("hi")]))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_surfaces_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/openai/deployments/missing/chat/completions")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"code":"DeploymentNotFound"}}"#)
        .create_async()
        .await;

    let client = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint(server.url())
        .api_version("2024-10-21")
        .build()
        .unwrap();

    let err = client
        .chat(ChatRequest::new("missing", vec![Message::human("hi")]))
        .await
        .unwrap_err()
        .to_string();

    assert!(err.contains("404"));
    assert!(err.contains("DeploymentNotFound"));
}
