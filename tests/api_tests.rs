// tests/api_tests.rs

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::extract::{Path, State};
use quiz_exam::{
    config::Config,
    error::QuizError,
    handlers::quiz::submit_session,
    models::{
        question::QuestionBank,
        submission::{NewSubmission, Submission},
    },
    quiz::{QuizSession, session::SessionStatus},
    routes,
    state::AppState,
    store::{SqliteSubmissionStore, SubmissionStore},
};
use sqlx::sqlite::SqlitePoolOptions;

const EXAM_KEY: [usize; 20] = [2, 1, 1, 1, 1, 2, 1, 1, 1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1];

fn questions_path() -> String {
    format!("{}/questions.json", env!("CARGO_MANIFEST_DIR"))
}

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        questions_path: questions_path(),
        bind_addr: "127.0.0.1:0".to_string(),
        report_utc_offset_hours: 3,
        session_ttl_secs: 3600,
        store_timeout_ms: 2_000,
        rust_log: "error".to_string(),
    }
}

async fn memory_store() -> Arc<dyn SubmissionStore> {
    // A single connection keeps the in-memory database alive and shared.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Arc::new(SqliteSubmissionStore::new(pool))
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app_with(store: Arc<dyn SubmissionStore>) -> String {
    spawn_app_with_config(store, test_config()).await
}

async fn spawn_app_with_config(store: Arc<dyn SubmissionStore>, config: Config) -> String {
    let bank = QuestionBank::load(&config.questions_path).expect("Bundled questions invalid");
    let state = AppState::new(store, bank, config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn spawn_app() -> String {
    spawn_app_with(memory_store().await).await
}

async fn start_session(client: &reqwest::Client, address: &str, name: &str, handle: &str) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/quiz/sessions", address))
        .json(&serde_json::json!({ "studentName": name, "telegramHandle": handle }))
        .send()
        .await
        .expect("Failed to start session");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn select(
    client: &reqwest::Client,
    address: &str,
    session_id: &str,
    question_index: usize,
    original_index: usize,
) -> reqwest::Response {
    client
        .put(format!(
            "{}/api/quiz/sessions/{}/answers/{}",
            address, session_id, question_index
        ))
        .json(&serde_json::json!({ "originalIndex": original_index }))
        .send()
        .await
        .expect("Failed to select answer")
}

async fn answer_all(client: &reqwest::Client, address: &str, session_id: &str, answers: &[usize]) {
    for (i, answer) in answers.iter().enumerate() {
        let response = select(client, address, session_id, i, *answer).await;
        assert_eq!(response.status().as_u16(), 200);
    }
}

async fn submit(client: &reqwest::Client, address: &str, session_id: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/quiz/sessions/{}/submit", address, session_id))
        .send()
        .await
        .expect("Failed to submit")
}

async fn dashboard(client: &reqwest::Client, address: &str) -> Vec<serde_json::Value> {
    client
        .get(format!("{}/api/dashboard/submissions", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn public_questions_hide_answers() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let questions: Vec<serde_json::Value> = client
        .get(format!("{}/api/quiz/questions", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(questions.len(), 20);
    assert!(questions.iter().all(|q| q.get("correctIndex").is_none()));
}

#[tokio::test]
async fn full_exam_flow_scores_twenty() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // 1. Start with the student's identity
    let session = start_session(&client, &address, "Ivan Petrov", "@ivanp").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();
    assert_eq!(session["totalQuestions"], 20);
    assert_eq!(session["questions"].as_array().unwrap().len(), 20);

    // 2. Pick the correct original index for every question
    answer_all(&client, &address, &session_id, &EXAM_KEY).await;

    // 3. Submit
    let response = submit(&client, &address, &session_id).await;
    assert_eq!(response.status().as_u16(), 200);
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 20);
    assert_eq!(result["totalQuestions"], 20);

    // 4. The stored record holds original indices and the score
    let rows = dashboard(&client, &address).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["studentName"], "Ivan Petrov");
    assert_eq!(rows[0]["telegramHandle"], "@ivanp");
    assert_eq!(rows[0]["score"], 20);
    assert_eq!(rows[0]["totalQuestions"], 20);
    assert_eq!(rows[0]["percentage"], 100);
    assert_eq!(rows[0]["answers"], serde_json::json!(EXAM_KEY));
}

#[tokio::test]
async fn same_identity_gets_same_shuffle() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let first = start_session(&client, &address, "Ivan Petrov", "@ivanp").await;
    let second = start_session(&client, &address, "  Ivan Petrov ", "@ivanp  ").await;
    assert_ne!(first["sessionId"], second["sessionId"]);
    assert_eq!(first["questions"], second["questions"]);

    // Re-reading the session returns the shuffle computed at start.
    let session_id = first["sessionId"].as_str().unwrap();
    let reread: serde_json::Value = client
        .get(format!("{}/api/quiz/sessions/{}", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reread["questions"], first["questions"]);

    // Every question still offers each original index exactly once.
    for question in first["questions"].as_array().unwrap() {
        let mut originals: Vec<u64> = question["options"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["originalIndex"].as_u64().unwrap())
            .collect();
        originals.sort_unstable();
        let expected: Vec<u64> = (0..originals.len() as u64).collect();
        assert_eq!(originals, expected);
    }
}

#[tokio::test]
async fn blank_identity_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/quiz/sessions", address))
        .json(&serde_json::json!({ "studentName": "   ", "telegramHandle": "@x" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn incomplete_session_is_not_submitted() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let session = start_session(&client, &address, "Anna", "@anna").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();
    answer_all(&client, &address, &session_id, &EXAM_KEY[..19]).await;

    let response = submit(&client, &address, &session_id).await;
    assert_eq!(response.status().as_u16(), 400);
    assert!(dashboard(&client, &address).await.is_empty());

    // Answers survive; finishing the last one allows the submit.
    let progress: serde_json::Value = select(&client, &address, &session_id, 19, 0)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(progress["answeredCount"], 20);

    let result: serde_json::Value = submit(&client, &address, &session_id).await.json().await.unwrap();
    assert_eq!(result["score"], 19);
}

#[tokio::test]
async fn invalid_selection_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let session = start_session(&client, &address, "Anna", "@anna").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();

    assert_eq!(select(&client, &address, &session_id, 20, 0).await.status().as_u16(), 400);
    assert_eq!(select(&client, &address, &session_id, 0, 9).await.status().as_u16(), 400);

    let unknown = uuid::Uuid::new_v4().to_string();
    assert_eq!(select(&client, &address, &unknown, 0, 0).await.status().as_u16(), 404);
}

#[tokio::test]
async fn submitted_session_is_closed() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let session = start_session(&client, &address, "Anna", "@anna").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();

    // Review is not available before submission.
    let early = client
        .get(format!("{}/api/quiz/sessions/{}/review", address, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(early.status().as_u16(), 409);

    answer_all(&client, &address, &session_id, &[0; 20]).await;
    assert_eq!(submit(&client, &address, &session_id).await.status().as_u16(), 200);

    assert_eq!(submit(&client, &address, &session_id).await.status().as_u16(), 409);
    assert_eq!(select(&client, &address, &session_id, 0, 1).await.status().as_u16(), 409);
    assert_eq!(dashboard(&client, &address).await.len(), 1);

    let review: serde_json::Value = client
        .get(format!("{}/api/quiz/sessions/{}/review", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(review["score"], 0);
    let items = review["questions"].as_array().unwrap();
    assert_eq!(items.len(), 20);
    assert!(items.iter().all(|q| q["isCorrect"] == false));
    assert_eq!(items[0]["correctLabel"], "C");
}

#[tokio::test]
async fn one_shot_submit_checks_answers() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/quiz/submit", address);

    let mut with_gap: Vec<Option<usize>> = EXAM_KEY.iter().copied().map(Some).collect();
    with_gap[19] = None;
    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "studentName": "Ivan Petrov",
            "telegramHandle": "@ivanp",
            "answers": with_gap,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "studentName": "Ivan Petrov",
            "telegramHandle": "@ivanp",
            "answers": &EXAM_KEY[..10],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(dashboard(&client, &address).await.is_empty());

    let mut one_wrong = EXAM_KEY;
    one_wrong[4] = 0;
    let result: serde_json::Value = client
        .post(&url)
        .json(&serde_json::json!({
            "studentName": "Ivan Petrov",
            "telegramHandle": "@ivanp",
            "answers": one_wrong,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["score"], 19);
    assert_eq!(result["totalQuestions"], 20);
}

#[tokio::test]
async fn dashboard_sorts_and_exports() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/quiz/submit", address);

    let mut half = EXAM_KEY;
    for answer in half.iter_mut().take(10) {
        *answer = 0;
    }

    for (name, answers) in [("Low", [0; 20]), ("Best", EXAM_KEY), ("Half", half)] {
        let response = client
            .post(&url)
            .json(&serde_json::json!({
                "studentName": name,
                "telegramHandle": format!("@{}", name.to_lowercase()),
                "answers": answers,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let rows = dashboard(&client, &address).await;
    let names: Vec<&str> = rows.iter().map(|r| r["studentName"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Best", "Half", "Low"]);
    assert_eq!(rows[0]["rank"], 1);

    let detail: serde_json::Value = client
        .get(format!("{}/api/dashboard/submissions/{}", address, rows[1]["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["score"], 10);
    assert_eq!(detail["questions"].as_array().unwrap().len(), 20);

    let missing = client
        .get(format!("{}/api/dashboard/submissions/99999", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let export = client
        .get(format!("{}/api/dashboard/export.csv", address))
        .send()
        .await
        .unwrap();
    assert_eq!(export.status().as_u16(), 200);
    assert!(
        export.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let body = export.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "Name,Telegram,Score,Date");
    assert!(lines[1].starts_with("Best,@best,20/20,"));
    assert!(lines[2].starts_with("Half,@half,10/20,"));
    assert!(lines[3].starts_with("Low,@low,0/20,"));
}

/// Fails the first `failures` writes, then delegates.
struct FlakyStore {
    inner: Arc<dyn SubmissionStore>,
    failures: AtomicUsize,
}

#[async_trait]
impl SubmissionStore for FlakyStore {
    async fn record(&self, submission: NewSubmission) -> Result<i64, QuizError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(QuizError::StorageUnavailable("backend offline".to_string()));
        }
        self.inner.record(submission).await
    }

    async fn list_all(&self) -> Result<Vec<Submission>, QuizError> {
        self.inner.list_all().await
    }

    async fn find(&self, id: i64) -> Result<Option<Submission>, QuizError> {
        self.inner.find(id).await
    }
}

#[tokio::test]
async fn storage_failure_keeps_answers_for_resubmit() {
    let store = Arc::new(FlakyStore {
        inner: memory_store().await,
        failures: AtomicUsize::new(1),
    });
    let address = spawn_app_with(store).await;
    let client = reqwest::Client::new();

    let session = start_session(&client, &address, "Ivan Petrov", "@ivanp").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();
    answer_all(&client, &address, &session_id, &EXAM_KEY).await;

    let failed = submit(&client, &address, &session_id).await;
    assert_eq!(failed.status().as_u16(), 503);
    let body: serde_json::Value = failed.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("try again"));

    let view: serde_json::Value = client
        .get(format!("{}/api/quiz/sessions/{}", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["answeredCount"], 20);
    assert_eq!(view["submitted"], false);

    let retried: serde_json::Value = submit(&client, &address, &session_id).await.json().await.unwrap();
    assert_eq!(retried["score"], 20);
    assert_eq!(dashboard(&client, &address).await.len(), 1);
}

/// Accepts every call and never answers a write.
struct HangingStore {
    inner: Arc<dyn SubmissionStore>,
}

#[async_trait]
impl SubmissionStore for HangingStore {
    async fn record(&self, _submission: NewSubmission) -> Result<i64, QuizError> {
        std::future::pending().await
    }

    async fn list_all(&self) -> Result<Vec<Submission>, QuizError> {
        self.inner.list_all().await
    }

    async fn find(&self, id: i64) -> Result<Option<Submission>, QuizError> {
        self.inner.find(id).await
    }
}

#[tokio::test]
async fn cancelled_submit_reopens_session() {
    // Arrange: a session with every answer filled, behind a store that never replies
    let store = Arc::new(HangingStore {
        inner: memory_store().await,
    });
    let config = test_config();
    let bank = QuestionBank::load(&config.questions_path).unwrap();
    let state = AppState::new(store, bank, config);

    let mut session = QuizSession::start("Ivan Petrov", "@ivanp", &state.bank).unwrap();
    for (i, answer) in EXAM_KEY.iter().enumerate() {
        session.select(i, *answer).unwrap();
    }
    let id = session.id;
    let handle = state.sessions.insert(session).await;

    // Act: the caller gives up while the store call is pending
    let attempt = tokio::time::timeout(
        Duration::from_millis(50),
        submit_session(State(state.clone()), Path(id)),
    )
    .await;
    assert!(attempt.is_err(), "store should not have answered");

    // Assert: answers kept and the session accepts another submit
    let mut session = handle.lock().await;
    assert_eq!(session.status(), SessionStatus::InProgress);
    assert_eq!(session.answered_count(), 20);
    assert!(session.begin_submit(&state.bank).is_ok());
}

#[tokio::test]
async fn slow_store_reports_unavailable_and_keeps_answers() {
    let store = Arc::new(HangingStore {
        inner: memory_store().await,
    });
    let mut config = test_config();
    config.store_timeout_ms = 100;
    let address = spawn_app_with_config(store, config).await;
    let client = reqwest::Client::new();

    let session = start_session(&client, &address, "Ivan Petrov", "@ivanp").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();
    answer_all(&client, &address, &session_id, &EXAM_KEY).await;

    assert_eq!(submit(&client, &address, &session_id).await.status().as_u16(), 503);

    let view: serde_json::Value = client
        .get(format!("{}/api/quiz/sessions/{}", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["submitted"], false);
    assert_eq!(view["answeredCount"], 20);

    // Still open: another submit reaches the store again instead of a 409.
    assert_eq!(submit(&client, &address, &session_id).await.status().as_u16(), 503);
}

#[tokio::test]
async fn expired_session_is_not_found() {
    let mut config = test_config();
    config.session_ttl_secs = 0;
    let address = spawn_app_with_config(memory_store().await, config).await;
    let client = reqwest::Client::new();

    let session = start_session(&client, &address, "Anna", "@anna").await;
    let session_id = session["sessionId"].as_str().unwrap().to_string();

    let response = client
        .get(format!("{}/api/quiz/sessions/{}", address, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(select(&client, &address, &session_id, 0, 0).await.status().as_u16(), 404);
}

