//! End-to-end tests of the HTTP transport against a mock chat service

mod common;

use axum::http::StatusCode;
use common::*;
use iris_core::*;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn session_as(role: &str) -> SessionState {
    SessionState::new(&ChatSettings {
        default_role: role.to_string(),
        reset_on_role_change: true,
    })
    .unwrap()
}

async fn accumulate(stream: TextStream) -> Vec<String> {
    let mut accumulator = StreamAccumulator::new(stream);
    let mut outputs = Vec::new();
    while let Some(step) = accumulator.next().await {
        outputs.push(step.unwrap());
    }
    outputs
}

#[tokio::test]
async fn test_health_check_ok() {
    let (addr, _state) = start_mock_chat_service(MockChatState::streaming(&[])).await;
    let service = ChatService::new(&api_settings(addr)).unwrap();
    assert!(service.health_check().await);
}

#[tokio::test]
async fn test_health_check_503_is_false() {
    let mut state = MockChatState::streaming(&[]);
    state.health_status = StatusCode::SERVICE_UNAVAILABLE;
    let (addr, _state) = start_mock_chat_service(state).await;

    let service = ChatService::new(&api_settings(addr)).unwrap();
    assert!(!service.health_check().await);
    assert!(matches!(
        ensure_available(&service).await,
        Err(IrisError::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_health_check_other_success_status_is_false() {
    let mut state = MockChatState::streaming(&[]);
    state.health_status = StatusCode::NO_CONTENT;
    let (addr, _state) = start_mock_chat_service(state).await;

    let service = ChatService::new(&api_settings(addr)).unwrap();
    assert!(!service.health_check().await);
}

#[tokio::test]
async fn test_health_check_unreachable_is_false() {
    let service = ChatService::new(&api_settings(unused_addr().await)).unwrap();
    assert!(!service.health_check().await);
}

#[tokio::test]
async fn test_health_check_timeout_is_false() {
    let mut state = MockChatState::streaming(&[]);
    state.health_delay = Duration::from_secs(2);
    let (addr, _state) = start_mock_chat_service(state).await;

    let mut settings = api_settings(addr);
    settings.health_timeout = Duration::from_millis(200);
    let service = ChatService::new(&settings).unwrap();
    assert!(!service.health_check().await);
}

#[tokio::test]
async fn test_return_policy_scenario() {
    let (addr, state) = start_mock_chat_service(MockChatState::streaming(&[
        r#"{"content":"Returns "}"#,
        r#"{"content":"are accepted within 30 days."}"#,
    ]))
    .await;
    let service = ChatService::new(&api_settings(addr)).unwrap();

    let stream = service
        .send_message("What is the return policy?", "hr_manager")
        .await
        .unwrap();
    assert_eq!(
        accumulate(stream).await,
        vec!["Returns ", "Returns are accepted within 30 days."]
    );

    let requests = state.requests.read().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        serde_json::json!({
            "question": "What is the return policy?",
            "user_role": "hr_manager"
        })
    );
}

#[tokio::test]
async fn test_malformed_line_is_skipped() {
    let (addr, _state) =
        start_mock_chat_service(MockChatState::streaming(&["not-json", r#"{"content":"ok"}"#])).await;
    let service = ChatService::new(&api_settings(addr)).unwrap();

    let stream = service.send_message("ping", "admin").await.unwrap();
    assert_eq!(accumulate(stream).await, vec!["ok"]);
}

#[tokio::test]
async fn test_records_split_across_network_chunks() {
    let (addr, _state) = start_mock_chat_service(MockChatState::with_chunks(vec![
        "{\"content\":\"Ret".to_string(),
        "urns \"}\n\n{\"status\":\"retrieving\"}\n{\"content\":".to_string(),
        "\"ok\"}\r\n{\"content\":\" done\"}".to_string(),
    ]))
    .await;
    let service = ChatService::new(&api_settings(addr)).unwrap();

    let stream = service.send_message("ping", "admin").await.unwrap();
    assert_eq!(
        accumulate(stream).await,
        vec!["Returns ", "Returns ok", "Returns ok done"]
    );
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let mut state = MockChatState::streaming(&[]);
    state.reply = QueryReply::Chunks(StatusCode::INTERNAL_SERVER_ERROR, vec!["boom".to_string()]);
    let (addr, _state) = start_mock_chat_service(state).await;
    let service = ChatService::new(&api_settings(addr)).unwrap();

    let err = service.send_message("ping", "admin").await.unwrap_err();
    assert!(matches!(err, IrisError::Api(_)));
    assert!(err
        .to_string()
        .starts_with("Failed to communicate with chat service"));
}

#[tokio::test]
async fn test_unreachable_service_rolls_back_user_turn() {
    let service = ChatService::new(&api_settings(unused_addr().await)).unwrap();
    let mut session = session_as("hr_manager");
    let before = session.turns().len();

    let result = run_exchange(&service, &mut session, "What is the return policy?", |_| {}).await;

    assert!(matches!(result, Err(IrisError::Api(_))));
    assert_eq!(session.turns().len(), before);
}

#[tokio::test]
async fn test_connection_dropped_mid_stream_rolls_back_user_turn() {
    let mut state = MockChatState::streaming(&[]);
    state.reply = QueryReply::Broken(vec!["{\"content\":\"Returns \"}\n".to_string()]);
    let (addr, _state) = start_mock_chat_service(state).await;
    let service = ChatService::new(&api_settings(addr)).unwrap();

    let mut session = session_as("hr_manager");
    session.append_turn(ConversationTurn::user("earlier"));
    session.append_turn(ConversationTurn::assistant("earlier answer"));
    let before = session.turns().len();

    let result = run_exchange(&service, &mut session, "What is the return policy?", |_| {}).await;

    assert!(result.is_err());
    assert_eq!(session.turns().len(), before);
    assert!(session
        .turns()
        .iter()
        .all(|turn| turn.text != "Returns "));
}

#[tokio::test]
async fn test_full_exchange_commits_answer() {
    let (addr, state) = start_mock_chat_service(MockChatState::streaming(&[
        r#"{"content":"Returns "}"#,
        r#"{"content":"are accepted within 30 days."}"#,
    ]))
    .await;
    let service = ChatService::new(&api_settings(addr)).unwrap();
    ensure_available(&service).await.unwrap();

    let mut session = session_as("admin");
    session.select_role("engineer").unwrap();

    let answer = run_exchange(&service, &mut session, "What is the return policy?", |_| {})
        .await
        .unwrap();

    assert_eq!(answer, "Returns are accepted within 30 days.");
    assert_eq!(session.turns().len(), 2);
    assert_eq!(session.turns()[1], ConversationTurn::assistant(answer));
    assert_eq!(state.requests.read().await[0]["user_role"], "engineer");
}

#[tokio::test]
async fn test_slow_answer_outlives_request_timeout() {
    let mut state = MockChatState::streaming(&[]);
    state.reply = QueryReply::Paced(
        (1..=5).map(|i| format!("{{\"content\":\"{} \"}}\n", i)).collect(),
        Duration::from_millis(300),
    );
    let (addr, _state) = start_mock_chat_service(state).await;

    let mut settings = api_settings(addr);
    settings.request_timeout = Duration::from_secs(1);
    let service = ChatService::new(&settings).unwrap();

    let stream = service.send_message("ping", "admin").await.unwrap();
    assert_eq!(collect_stream(stream).await.unwrap(), "1 2 3 4 5 ");
}

#[tokio::test]
async fn test_stalled_answer_times_out_between_reads() {
    let mut state = MockChatState::streaming(&[]);
    state.reply = QueryReply::Stalled(vec!["{\"content\":\"Returns \"}\n".to_string()]);
    let (addr, _state) = start_mock_chat_service(state).await;

    let mut settings = api_settings(addr);
    settings.request_timeout = Duration::from_millis(500);
    let service = ChatService::new(&settings).unwrap();

    let stream = service.send_message("ping", "admin").await.unwrap();
    let mut accumulator = StreamAccumulator::new(stream);
    assert_eq!(accumulator.next().await.unwrap().unwrap(), "Returns ");
    let err = tokio::time::timeout(Duration::from_secs(5), accumulator.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, IrisError::Api(_)));
}

#[tokio::test]
async fn test_dropping_accumulator_closes_connection() {
    let mut state = MockChatState::streaming(&[]);
    state.reply = QueryReply::Stalled(vec!["{\"content\":\"Returns \"}\n".to_string()]);
    let (addr, state) = start_mock_chat_service(state).await;
    let service = ChatService::new(&api_settings(addr)).unwrap();

    let stream = service.send_message("ping", "admin").await.unwrap();
    let mut accumulator = StreamAccumulator::new(stream);
    assert_eq!(accumulator.next().await.unwrap().unwrap(), "Returns ");
    drop(accumulator);

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while !state.body_dropped.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(closed.is_ok(), "server never saw the connection close");
}
