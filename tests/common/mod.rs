#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use coach::config::Config;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fake server error");
    });
    format!("http://{addr}")
}

/// Client config pointing both services at fake servers.
pub fn config(lichess_base_url: &str, gemini_base_url: &str) -> Config {
    Config {
        lichess_base_url: lichess_base_url.to_string(),
        gemini_base_url: gemini_base_url.to_string(),
        gemini_api_key: "test-key".to_string(),
        gemini_model: "gemini-test".to_string(),
        http_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub const SAMPLE_PGN: &str = r#"[Event "Rated Blitz game"]
[Site "https://lichess.org/abcd1234"]
[White "Lance5500"]
[Black "TryingHard87"]
[Result "1-0"]

1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0
"#;

pub fn analysis_json() -> serde_json::Value {
    serde_json::json!({
        "opening": { "score": 85, "feedback": "Aggressive start.", "errors": [] },
        "middlegame": { "score": 60, "feedback": "Short game.", "errors": [] },
        "tactics": { "score": 95, "feedback": "Spotted the mate.", "errors": [] },
        "endgame": { "score": 50, "feedback": "No endgame reached.", "errors": [] },
        "overallAdvice": "Keep developing pieces before attacking.",
        "referencedBooks": ["Logical Chess: Move by Move"]
    })
}
