//! Integration tests for the exchange coordinator against a mocked backend.
//!
//! Run with:
//!   cargo test --test test_exchange

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use acme_chat::backend::ChatClient;
use acme_chat::conversation::{Conversation, Message, Role};
use acme_chat::coordinator::{
    CONNECT_ERROR_TEXT, ExchangeCoordinator, GENERIC_ERROR_TEXT, SubmitOutcome,
};

// ── helpers ──────────────────────────────────────────────────────────────────

async fn coordinator_for(server: &MockServer) -> ExchangeCoordinator {
    let client = ChatClient::new(&server.uri(), 5).expect("build client");
    ExchangeCoordinator::new(client)
}

fn success_body(answer: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "answer": answer,
        "sources": [],
        "timestamp": "2026-08-30T00:00:00"
    })
}

async fn mount_chat(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(template)
        .mount(server)
        .await;
}

// ── empty input ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_input_is_a_no_op() {
    let server = MockServer::start().await;
    // Any request reaching the mock fails the expectation at teardown.
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("x")))
        .expect(0)
        .mount(&server)
        .await;
    let coordinator = coordinator_for(&server).await;

    assert_eq!(coordinator.submit("").await, SubmitOutcome::Ignored);
    assert_eq!(coordinator.submit("   ").await, SubmitOutcome::Ignored);
    assert_eq!(coordinator.submit("\t\n").await, SubmitOutcome::Ignored);
    assert!(coordinator.is_empty());
}

// ── outcome mapping ──────────────────────────────────────────────────────────

#[tokio::test]
async fn success_appends_user_then_assistant() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(success_body("Acme was founded in 2010.")),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    let outcome = coordinator.submit("When was Acme founded?").await;
    assert_eq!(outcome, SubmitOutcome::Completed);

    let log = coordinator.snapshot();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], Message::user("When was Acme founded?"));
    assert_eq!(log[1], Message::assistant("Acme was founded in 2010.", Vec::new()));
}

#[tokio::test]
async fn input_is_trimmed_before_append() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(success_body("ok")),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("  What products does Acme offer?  ").await;
    assert_eq!(coordinator.snapshot()[0].content, "What products does Acme offer?");
}

#[tokio::test]
async fn application_failure_maps_to_server_error_text() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"success": false, "error": "No matching documents"})),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("Anything about llamas?").await;
    let log = coordinator.snapshot();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1], Message::error("No matching documents"));
}

#[tokio::test]
async fn application_failure_without_message_uses_fallback() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("hm").await;
    assert_eq!(coordinator.snapshot()[1], Message::error(GENERIC_ERROR_TEXT));
}

#[tokio::test]
async fn connection_refused_maps_to_connect_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let client = ChatClient::new(&format!("http://{addr}"), 2).expect("build client");
    let coordinator = ExchangeCoordinator::new(client);

    coordinator.submit("anyone there?").await;
    let log = coordinator.snapshot();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1], Message::error(CONNECT_ERROR_TEXT));
}

#[tokio::test]
async fn unparseable_body_maps_to_connect_error() {
    let server = MockServer::start().await;
    mount_chat(&server, ResponseTemplate::new(200).set_body_string("<html>nope</html>")).await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("q").await;
    assert_eq!(coordinator.snapshot()[1], Message::error(CONNECT_ERROR_TEXT));
}

#[tokio::test]
async fn http_error_without_envelope_maps_to_connect_error() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(500)
            .set_body_json(serde_json::json!({"detail": "Internal server error"})),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("q").await;
    assert_eq!(coordinator.snapshot()[1], Message::error(CONNECT_ERROR_TEXT));
}

#[tokio::test]
async fn sources_are_carried_onto_the_assistant_turn() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "answer": "Two products.",
            "sources": [
                {"document_name": "products.md", "chunk_text": "AcmeFlow...", "similarity": 0.91},
                {"document_name": "company.md", "chunk_text": "Acme...", "similarity": 0.4}
            ]
        })),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("What products does Acme offer?").await;
    let log = coordinator.snapshot();
    assert_eq!(log[1].role, Role::Assistant);
    assert_eq!(log[1].sources.len(), 2);
    assert_eq!(log[1].sources[0].document_name, "products.md");
    assert!((log[1].sources[1].similarity - 0.4).abs() < f64::EPSILON);
}

// ── context windowing on the wire ────────────────────────────────────────────

#[tokio::test]
async fn request_carries_last_six_dialogue_turns() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(success_body("fine")),
    )
    .await;

    // Eight alternating dialogue turns plus one error turn mid-history.
    let mut conversation = Conversation::new();
    for i in 1..=4 {
        conversation.append(Message::user(format!("q{i}")));
        conversation.append(Message::assistant(format!("a{i}"), Vec::new()));
    }
    conversation.append(Message::error("backend was down"));

    let client = ChatClient::new(&server.uri(), 5).expect("build client");
    let coordinator = ExchangeCoordinator::with_conversation(client, conversation);
    coordinator.submit("q5").await;

    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().expect("json body");

    assert_eq!(body["question"], "q5");
    let history = body["conversation_history"].as_array().expect("history array");
    assert_eq!(history.len(), 6);
    // q1/a1 fall off; the error turn is excluded; q5 itself is not history.
    let expected = [
        ("q2", ""), ("", "a2"), ("q3", ""), ("", "a3"), ("q4", ""), ("", "a4"),
    ];
    for (pair, (q, a)) in history.iter().zip(expected) {
        assert_eq!(pair["question"], q);
        assert_eq!(pair["answer"], a);
    }
}

#[tokio::test]
async fn first_turn_sends_empty_history() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200).set_body_json(success_body("hello")),
    )
    .await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("hi").await;
    let requests = server.received_requests().await.expect("requests recorded");
    let body: serde_json::Value = requests[0].body_json().expect("json body");
    assert_eq!(body["conversation_history"].as_array().expect("array").len(), 0);
}

// ── busy gate ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_submit_is_rejected_busy() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(success_body("slow answer"))
            .set_delay(Duration::from_millis(250)),
    )
    .await;
    let client = ChatClient::new(&server.uri(), 5).expect("build client");
    let coordinator = Arc::new(ExchangeCoordinator::new(client));

    let racer = coordinator.clone();
    let (first, second) = tokio::join!(coordinator.submit("first question"), async move {
        // Let the first submit pass the gate and block on the response.
        tokio::time::sleep(Duration::from_millis(50)).await;
        racer.submit("second question").await
    });

    assert_eq!(first, SubmitOutcome::Completed);
    assert_eq!(second, SubmitOutcome::Busy);

    // The rejected submit left no trace — one clean user/outcome pair.
    let log = coordinator.snapshot();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].content, "first question");
    assert_eq!(log[1].content, "slow answer");
    assert!(!coordinator.is_busy());
}

#[tokio::test]
async fn gate_is_released_after_failure() {
    let server = MockServer::start().await;
    mount_chat(&server, ResponseTemplate::new(200).set_body_string("garbage")).await;
    let coordinator = coordinator_for(&server).await;

    coordinator.submit("first").await;
    assert!(!coordinator.is_busy());

    // The session continues: a later submit runs a fresh exchange.
    let outcome = coordinator.submit("second").await;
    assert_eq!(outcome, SubmitOutcome::Completed);
    assert_eq!(coordinator.snapshot().len(), 4);
}
