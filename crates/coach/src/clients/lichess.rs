use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::clients::GameSource;
use crate::config::Config;
use crate::error::LichessError;

/// How many recent games a username search lists.
pub const RECENT_GAMES_MAX: usize = 10;

/// One entry of a user's recent-games list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub id: String,
    pub white_name: String,
    pub black_name: String,
    pub created_at_epoch_millis: i64,
    pub status: String,
    pub variant: String,
}

impl GameSummary {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at_epoch_millis)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    id: String,
    created_at: i64,
    status: String,
    variant: String,
    players: RawPlayers,
}

#[derive(Deserialize)]
struct RawPlayers {
    white: RawPlayer,
    black: RawPlayer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayer {
    user: Option<RawUser>,
    ai_level: Option<u8>,
}

#[derive(Deserialize)]
struct RawUser {
    name: String,
}

impl RawPlayer {
    fn display_name(self) -> String {
        match (self.user, self.ai_level) {
            (Some(user), _) => user.name,
            (None, Some(level)) => format!("Stockfish level {level}"),
            (None, None) => "Anonymous".to_string(),
        }
    }
}

impl From<RawGame> for GameSummary {
    fn from(raw: RawGame) -> Self {
        Self {
            id: raw.id,
            white_name: raw.players.white.display_name(),
            black_name: raw.players.black.display_name(),
            created_at_epoch_millis: raw.created_at,
            status: raw.status,
            variant: raw.variant,
        }
    }
}

/// Parse an NDJSON games listing. Blank lines are skipped; any malformed
/// line fails the whole listing.
pub fn parse_game_list(body: &str) -> Result<Vec<GameSummary>, LichessError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<RawGame>(line)
                .map(GameSummary::from)
                .map_err(LichessError::from)
        })
        .collect()
}

pub struct LichessClient {
    client: Client,
    base_url: Url,
}

impl LichessClient {
    pub fn new(config: &Config) -> Result<Self, LichessError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.http_timeout)
            .build()?;
        let base_url = Url::parse(&config.lichess_base_url)
            .map_err(|e| LichessError::InvalidBaseUrl(format!("{}: {e}", config.lichess_base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(LichessError::InvalidBaseUrl(config.lichess_base_url.clone()));
        }
        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded as one path
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, LichessError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LichessError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch the most recent games of a user, without moves.
    pub async fn list_recent_games(&self, username: &str) -> Result<Vec<GameSummary>, LichessError> {
        let url = self.endpoint(&["api", "games", "user", username.trim()])?;
        let max = RECENT_GAMES_MAX.to_string();
        let params = [
            ("max", max.as_str()),
            ("moves", "false"),
            ("pgnInJson", "false"),
        ];

        let resp = self
            .client
            .get(url)
            .query(&params)
            .header("Accept", "application/x-ndjson")
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::warn!(username, status = %resp.status(), "Lichess game list request failed");
            return Err(LichessError::NotFoundOrPrivate);
        }

        let text = resp.text().await?;
        let games = parse_game_list(&text)?;
        tracing::info!(username, count = games.len(), "Fetched Lichess games");
        Ok(games)
    }

    /// Fetch the PGN of a single game. The body is returned untouched.
    pub async fn fetch_game_pgn(&self, game_id: &str) -> Result<String, LichessError> {
        let url = self.endpoint(&["game", "export", game_id.trim()])?;

        let resp = self
            .client
            .get(url)
            .query(&[("moves", "true"), ("pgnInJson", "false")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(game_id, %status, "Lichess game export failed");
            return Err(LichessError::FetchFailed(status));
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl GameSource for LichessClient {
    async fn list_recent_games(&self, username: &str) -> Result<Vec<GameSummary>, LichessError> {
        LichessClient::list_recent_games(self, username).await
    }

    async fn fetch_game_pgn(&self, game_id: &str) -> Result<String, LichessError> {
        LichessClient::fetch_game_pgn(self, game_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{"id":"q7ZvsdUF","rated":true,"variant":"standard","speed":"blitz","createdAt":1514505150384,"status":"mate","players":{"white":{"user":{"name":"Lance5500","id":"lance5500"},"rating":2389},"black":{"user":{"name":"TryingHard87","id":"tryinghard87"},"rating":2498}}}

{"id":"aiGame01","variant":"chess960","createdAt":1514505000000,"status":"resign","players":{"white":{"aiLevel":3},"black":{"user":{"name":"Lance5500"}}}}
"#;

    #[test]
    fn test_parse_game_list() {
        let games = parse_game_list(LISTING).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "q7ZvsdUF");
        assert_eq!(games[0].white_name, "Lance5500");
        assert_eq!(games[0].black_name, "TryingHard87");
        assert_eq!(games[0].status, "mate");
        assert_eq!(games[0].variant, "standard");
        assert_eq!(games[0].created_at_epoch_millis, 1514505150384);
        assert_eq!(games[1].white_name, "Stockfish level 3");
        assert_eq!(
            games[0].created_at().unwrap().format("%Y-%m-%d").to_string(),
            "2017-12-28"
        );
    }

    #[test]
    fn test_malformed_line_fails_whole_listing() {
        let body = format!("{}\n{{\"id\": \"broken\"", LISTING);
        assert!(matches!(
            parse_game_list(&body),
            Err(LichessError::MalformedGame(_))
        ));
    }

    #[test]
    fn test_endpoint_encodes_path_segments() {
        let config = Config {
            lichess_base_url: "https://lichess.example/proxy/".into(),
            ..Config::default()
        };
        let client = LichessClient::new(&config).unwrap();
        let url = client.endpoint(&["api", "games", "user", "a/b?max=100"]).unwrap();
        assert_eq!(url.as_str(), "https://lichess.example/proxy/api/games/user/a%2Fb%3Fmax=100");

        let bad = Config { lichess_base_url: "not a url".into(), ..Config::default() };
        assert!(matches!(LichessClient::new(&bad), Err(LichessError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse_game_list("").unwrap().is_empty());
        assert!(parse_game_list("\n\n").unwrap().is_empty());
    }
}
