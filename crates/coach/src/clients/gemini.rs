//! Gemini `generateContent` client for game analysis and coach chat.
//!
//! Both calls are a single request/response round trip. Analysis asks for a
//! JSON body constrained by a response schema; chat sends the whole
//! conversation flattened into one prompt so no server-side session is kept.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::clients::CoachService;
use crate::coaching::{ChatContext, ChatRole, FullAnalysis, Phase};
use crate::config::Config;
use crate::error::CoachError;

const ANALYSIS_INSTRUCTION: &str = "You are a chess grandmaster and coach. Analyze the game given \
in PGN and evaluate the player's performance in four phases: opening, middlegame, tactics and \
endgame. For each phase give a score from 0 to 100, concise feedback, and a list of concrete \
errors (with move numbers when possible). Finish with overall advice and recommend classic chess \
books relevant to the weaknesses you found.";

const CHAT_INSTRUCTION: &str = "You are a friendly, expert chess coach. Answer questions about \
the game and the current position clearly and concisely. Use standard algebraic notation when \
referring to moves, and explain the ideas behind them.";

pub const CHAT_FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't come up with a reply. Please try asking again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: Some(text.into()) }],
        }
    }
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// JSON schema the analysis response must follow.
pub fn analysis_schema() -> Value {
    let phase = json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "INTEGER", "description": "Score from 0 to 100" },
            "feedback": { "type": "STRING" },
            "errors": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["score", "feedback", "errors"]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "opening": phase,
            "middlegame": phase,
            "tactics": phase,
            "endgame": phase,
            "overallAdvice": { "type": "STRING" },
            "referencedBooks": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["opening", "middlegame", "tactics", "endgame", "overallAdvice", "referencedBooks"]
    })
}

/// Parse the JSON text of an analysis response.
pub fn parse_analysis(text: &str) -> Result<FullAnalysis, CoachError> {
    serde_json::from_str(text.trim()).map_err(|e| CoachError::InvalidAnalysisFormat(e.to_string()))
}

/// Flatten the chat context into the single prompt sent to the model.
pub fn build_chat_prompt(ctx: &ChatContext) -> String {
    let mut prompt = String::from("Context:\n");
    let pgn = if ctx.pgn.trim().is_empty() { "(no moves yet)" } else { ctx.pgn.trim() };
    prompt.push_str(&format!("Current game PGN: {pgn}\n"));
    prompt.push_str(&format!("Current position (FEN): {}\n", ctx.fen));

    if let Some(analysis) = &ctx.analysis {
        let scores: Vec<String> = Phase::ALL
            .iter()
            .map(|&p| format!("{} {}/100", p.label(), analysis.phase(p).score))
            .collect();
        prompt.push_str(&format!("Analysis scores: {}\n", scores.join(", ")));
    }

    prompt.push_str("\nConversation:\n");
    for msg in &ctx.history {
        let speaker = match msg.role {
            ChatRole::User => "Human",
            ChatRole::Assistant => "Assistant",
        };
        prompt.push_str(&format!("{speaker}: {}\n", msg.content));
    }
    prompt.push_str(&format!("Human: {}\nAssistant:", ctx.query));
    prompt
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, CoachError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, CoachError> {
        if self.api_key.is_empty() {
            return Err(CoachError::MissingApiKey);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, "Sending Gemini request");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(%status, "Gemini API error");
            return Err(CoachError::Api { status, body });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| CoachError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &parsed.usage_metadata {
            info!(
                prompt_tokens = ?usage.prompt_token_count,
                response_tokens = ?usage.candidates_token_count,
                "Gemini usage"
            );
        }
        Ok(parsed)
    }

    pub async fn analyze_game(&self, pgn: &str) -> Result<FullAnalysis, CoachError> {
        let request = GenerateRequest {
            system_instruction: Content::text(None, ANALYSIS_INSTRUCTION),
            contents: vec![Content::text(Some("user"), format!("Analyze this game:\n\n{pgn}"))],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: analysis_schema(),
            }),
        };

        let resp = self.generate(&request).await?;
        let text = resp
            .first_text()
            .ok_or_else(|| CoachError::InvalidAnalysisFormat("empty response".into()))?;
        parse_analysis(&text)
    }

    pub async fn chat_reply(&self, ctx: &ChatContext) -> Result<String, CoachError> {
        let request = GenerateRequest {
            system_instruction: Content::text(None, CHAT_INSTRUCTION),
            contents: vec![Content::text(Some("user"), build_chat_prompt(ctx))],
            generation_config: None,
        };

        let resp = self.generate(&request).await?;
        Ok(resp.first_text().unwrap_or_else(|| CHAT_FALLBACK_REPLY.to_string()))
    }
}

#[async_trait]
impl CoachService for GeminiClient {
    async fn analyze_game(&self, pgn: &str) -> Result<FullAnalysis, CoachError> {
        GeminiClient::analyze_game(self, pgn).await
    }

    async fn chat_reply(&self, ctx: &ChatContext) -> Result<String, CoachError> {
        GeminiClient::chat_reply(self, ctx).await
    }
}
