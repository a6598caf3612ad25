//! Test utilities for finiq-core
//!
//! This module provides a mock Ollama server that answers the bucket and
//! coaching prompts, for development and integration tests.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// How the mock answers `/api/generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Every generate call returns HTTP 500
    Failing,
    /// Coaching answers are plain prose instead of JSON
    Prose,
    /// Every generate call stalls before answering
    Slow,
}

/// How long a `Slow` server stalls
const SLOW_RESPONSE_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with_mode(Mode::Normal).await
    }

    /// Server whose generate endpoint always fails
    pub async fn start_failing() -> Self {
        Self::start_with_mode(Mode::Failing).await
    }

    /// Server whose coaching replies are not JSON
    pub async fn start_prose() -> Self {
        Self::start_with_mode(Mode::Prose).await
    }

    /// Server that takes several seconds to answer generate calls
    pub async fn start_slow() -> Self {
        Self::start_with_mode(Mode::Slow).await
    }

    async fn start_with_mode(mode: Mode) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(mode);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "gemma3:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 3_300_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(mode): State<Mode>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    if mode == Mode::Failing {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    if mode == Mode::Slow {
        tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
    }

    // These patterns match the prompt files in prompts/*.md
    let response = if request.prompt.contains("Status: ") {
        if mode == Mode::Prose {
            "Great job today, keep going!".to_string()
        } else {
            handle_coaching_mock(&request.prompt)
        }
    } else {
        handle_bucket_mock(&request.prompt)
    };

    Ok(Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    }))
}

/// Bucket from keywords in the Category/Description lines only
fn handle_bucket_mock(prompt: &str) -> String {
    let category = extract_line(prompt, "Category: ").unwrap_or_default();
    let description = extract_line(prompt, "Description: ").unwrap_or_default();
    let text = format!("{} {}", category, description).to_lowercase();

    let bucket = if ["swiggy", "zomato", "movie", "cafe"]
        .iter()
        .any(|k| text.contains(k))
    {
        "fun"
    } else if ["recharge", "electric", "wifi", "phone"]
        .iter()
        .any(|k| text.contains(k))
    {
        "bills"
    } else if ["petrol", "fuel", "pharmacy", "kirana"]
        .iter()
        .any(|k| text.contains(k))
    {
        "essentials"
    } else if text.contains("gibberish") {
        "luxury"
    } else {
        "other"
    };

    format!(r#"{{"bucket": "{}"}}"#, bucket)
}

/// Coaching JSON wrapped in a code fence, the way chat models often answer
fn handle_coaching_mock(prompt: &str) -> String {
    let name = extract_line(prompt, "User name: ").unwrap_or_else(|| "friend".to_string());
    let status = extract_line(prompt, "Status: ").unwrap_or_default();

    let daily = match status.as_str() {
        "over_limit" => format!("{}, you are over today's safe limit.", name),
        "within_limit" => format!("{}, you are within today's safe limit.", name),
        _ => format!("{}, please upload a bank statement.", name),
    };

    let body = serde_json::json!({
        "daily_message": daily,
        "weekly_message": "Keep the week balanced.",
        "monthly_message": "Small steps build a stable month.",
    });

    format!("```json\n{}\n```", body)
}

fn extract_line(prompt: &str, prefix: &str) -> Option<String> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .map(|rest| rest.trim().to_string())
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    #[serde(default)]
    system: Option<String>,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIBackend, AIClient, OllamaBackend};
    use crate::classify::{AssignmentSource, BucketClassifier};
    use crate::coach::{build_daily_report, CoachingRequest};
    use crate::daily::evaluate_daily_insight;
    use crate::models::{Bucket, CoachingMessages, IncomeProfile, InsightStatus, Language};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn insight(spent: f64) -> crate::models::DailyInsight {
        evaluate_daily_insight(
            7,
            NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
            &IncomeProfile::from_daily(1000.0),
            spent,
        )
    }

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_classify_bucket() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");

        let result = client.classify_bucket("phone", "Jio recharge").await.unwrap();
        assert_eq!(result.to_bucket(), Some(Bucket::Bills));

        let result = client.classify_bucket("misc", "").await.unwrap();
        assert_eq!(result.to_bucket(), Some(Bucket::Other));
    }

    #[tokio::test]
    async fn test_classifier_over_http() {
        let server = MockOllamaServer::start().await;
        let classifier = BucketClassifier::new(Some(AIClient::ollama(&server.url(), "test-model")));

        let table = classifier.classify("utilities", "Zomato").await;
        assert_eq!(table.bucket, Bucket::Bills);
        assert_eq!(table.source, AssignmentSource::Table);

        let ai = classifier.classify("travel", "Petrol refill").await;
        assert_eq!(ai.bucket, Bucket::Essentials);
        assert_eq!(ai.source, AssignmentSource::Ai);

        // The model answers with a bucket that doesn't exist
        let unknown = classifier.classify("gifts", "gibberish").await;
        assert_eq!(unknown.bucket, Bucket::Other);
        assert_eq!(unknown.source, AssignmentSource::Fallback);
    }

    #[tokio::test]
    async fn test_classifier_with_failing_server() {
        let server = MockOllamaServer::start_failing().await;
        let classifier = BucketClassifier::new(Some(AIClient::ollama(&server.url(), "test-model")));

        let result = classifier.classify("travel", "Petrol refill").await;
        assert_eq!(result.bucket, Bucket::Other);
        assert_eq!(result.source, AssignmentSource::Fallback);
    }

    #[tokio::test]
    async fn test_classifier_with_slow_server_times_out() {
        let server = MockOllamaServer::start_slow().await;
        let classifier = BucketClassifier::new(Some(AIClient::ollama(&server.url(), "test-model")))
            .with_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let result = classifier.classify("travel", "Petrol refill").await;
        assert_eq!(result.bucket, Bucket::Other);
        assert_eq!(result.source, AssignmentSource::Fallback);
        assert!(started.elapsed() < SLOW_RESPONSE_DELAY);

        // The timed-out answer is cached, so the second lookup doesn't wait
        let started = std::time::Instant::now();
        let again = classifier.classify("travel", "Petrol refill").await;
        assert_eq!(again.source, AssignmentSource::Fallback);
        assert!(started.elapsed() < SLOW_RESPONSE_DELAY);
    }

    #[tokio::test]
    async fn test_coaching_over_http_strips_fences() {
        let server = MockOllamaServer::start().await;
        let ai = AIClient::ollama(&server.url(), "test-model");

        let report = build_daily_report(Some(&ai), insight(700.0), "Ravi", Language::En).await;
        assert_eq!(report.insight.status, InsightStatus::OverLimit);
        assert_eq!(
            report.message.daily_message,
            "Ravi, you are over today's safe limit."
        );
        assert_eq!(report.message.weekly_message, "Keep the week balanced.");
    }

    #[tokio::test]
    async fn test_coaching_prose_reply_goes_to_daily_message() {
        let server = MockOllamaServer::start_prose().await;
        let client = OllamaBackend::new(&server.url(), "test-model");
        let request = CoachingRequest::from_insight(&insight(100.0), "Ravi", Language::Hi);

        let messages = client.generate_coaching(&request).await.unwrap();
        assert_eq!(messages.daily_message, "Great job today, keep going!");
        assert!(messages.weekly_message.is_empty());
        assert!(messages.monthly_message.is_empty());
    }

    #[tokio::test]
    async fn test_coaching_with_failing_server_is_empty() {
        let server = MockOllamaServer::start_failing().await;
        let ai = AIClient::ollama(&server.url(), "test-model");

        let report = build_daily_report(Some(&ai), insight(100.0), "Ravi", Language::En).await;
        assert_eq!(report.message, CoachingMessages::default());
        assert_eq!(report.insight.status, InsightStatus::WithinLimit);
    }
}
