use foundry_llm::{ChatRequest, Message, TokenUsage};
use foundry_observability::{
    new_span_id, observer_from_config, AppInsightsObserver, ChatObservation, Observer,
    RunObservation, TelemetryConfig, AZURE_AI_SYSTEM,
};
use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::json;

fn accepted(count: u32) -> String {
    json!({"itemsReceived": count, "itemsAccepted": count, "errors": []}).to_string()
}

fn chat_observation(run_id: &str) -> ChatObservation {
    let request = ChatRequest::new("gpt-4o", vec![Message::human("Hey, can you help me with my taxes?")]);
    let mut observation = ChatObservation::from_request(run_id, new_span_id(), AZURE_AI_SYSTEM, &request);
    observation.output = Some("Of course.".into());
    observation.usage = Some(TokenUsage { input_tokens: 12, output_tokens: 3, total_tokens: 15 });
    observation
}

#[tokio::test]
async fn test_chat_span_and_request_are_exported_under_one_operation() {
    let mut server = Server::new_async().await;
    let dependency = server
        .mock("POST", "/v2/track")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""baseType":"RemoteDependencyData""#.into()),
            Matcher::Regex(r#""gen_ai.request.model":"gpt-4o""#.into()),
            Matcher::Regex(r#""ai.cloud.role":"chat-with-trace""#.into()),
            Matcher::Regex(r#""ai.operation.id":"[0-9a-f]{32}""#.into()),
        ]))
        .with_status(200)
        .with_body(accepted(1))
        .create_async()
        .await;
    let request = server
        .mock("POST", "/v2/track")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""baseType":"RequestData""#.into()),
            Matcher::Regex(r#""success":true"#.into()),
        ]))
        .with_status(200)
        .with_body(accepted(1))
        .create_async()
        .await;

    let config = TelemetryConfig::new("chat-with-trace");
    let connection_string = format!("InstrumentationKey=test-key;IngestionEndpoint={}/", server.url());
    let observer = AppInsightsObserver::new(&connection_string, &config).unwrap();

    observer.trace_start("run-1".into(), "chat-with-trace".into()).await.unwrap();
    observer.record_chat(chat_observation("run-1")).await.unwrap();
    observer.trace_end("run-1".into(), "success".into(), 42).await.unwrap();

    dependency.assert_async().await;
    request.assert_async().await;
}

#[tokio::test]
async fn test_captured_content_is_exported_when_enabled() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/track")
        .match_body(Matcher::Regex("my taxes".into()))
        .with_status(200)
        .with_body(accepted(1))
        .create_async()
        .await;

    let config = TelemetryConfig::new("chat-with-trace").with_capture_message_content(true);
    let connection_string = format!("InstrumentationKey=test-key;IngestionEndpoint={}", server.url());
    let observer = AppInsightsObserver::new(&connection_string, &config).unwrap();

    observer.record_chat(chat_observation("standalone")).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_run_span_reports_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/track")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""resultCode":"failed""#.into()),
            Matcher::Regex(r#""success":false"#.into()),
            Matcher::Regex(r#""gen_ai.agent.id":"asst_1""#.into()),
        ]))
        .with_status(200)
        .with_body(accepted(1))
        .create_async()
        .await;

    let connection_string = format!("InstrumentationKey=test-key;IngestionEndpoint={}", server.url());
    let observer = AppInsightsObserver::new(&connection_string, &TelemetryConfig::default()).unwrap();

    observer
        .record_run(RunObservation {
            span_id: new_span_id(),
            run_id: "run-1".into(),
            agent_id: "asst_1".into(),
            thread_id: "thread_1".into(),
            remote_run_id: "run_abc".into(),
            status: "failed".into(),
            started_at: Utc::now(),
            duration_ms: 1500,
            input: None,
            output: None,
            last_error: Some("server_error: boom".into()),
            usage: None,
        })
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_partial_acceptance_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v2/track")
        .with_status(206)
        .with_body(
            json!({
                "itemsReceived": 1,
                "itemsAccepted": 0,
                "errors": [{"index": 0, "statusCode": 400, "message": "Invalid instrumentation key"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let connection_string = format!("InstrumentationKey=bad;IngestionEndpoint={}", server.url());
    let observer = AppInsightsObserver::new(&connection_string, &TelemetryConfig::default()).unwrap();

    let err = observer.record_chat(chat_observation("run-1")).await.unwrap_err();
    assert!(err.to_string().contains("Invalid instrumentation key"));
}

#[tokio::test]
async fn test_trace_end_without_start_fails() {
    let connection_string = "InstrumentationKey=test-key;IngestionEndpoint=http://127.0.0.1:9";
    let observer = AppInsightsObserver::new(connection_string, &TelemetryConfig::default()).unwrap();

    assert!(observer.trace_end("missing".into(), "success".into(), 1).await.is_err());
}

#[tokio::test]
async fn test_observer_from_config_falls_back_to_logs() {
    let observer = observer_from_config(&TelemetryConfig::default()).unwrap();

    observer.trace_start("run-1".into(), "local".into()).await.unwrap();
    observer.record_chat(chat_observation("run-1")).await.unwrap();
    observer.trace_end("run-1".into(), "success".into(), 5).await.unwrap();
}

#[test]
fn test_invalid_connection_string_is_rejected() {
    let config = TelemetryConfig::default().with_app_insights("IngestionEndpoint=https://x");
    assert!(observer_from_config(&config).is_err());
}
