use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::lrc::LrcParser;
use crate::core::services::catalog::{CatalogClient, SongRef};
use crate::error::NetworkError;

const RETRY_BASE_MILLIS: u64 = 300;

#[derive(Deserialize, Debug)]
struct SearchResponse {
    code: Option<i64>,
    result: Option<SearchBody>,
}

#[derive(Deserialize, Debug)]
struct SearchBody {
    #[serde(default)]
    songs: Vec<SongItem>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum SongId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize, Debug)]
struct SongItem {
    id: SongId,
    name: Option<String>,
    #[serde(default, alias = "ar")]
    artists: Vec<ArtistItem>,
}

#[derive(Deserialize, Debug)]
struct ArtistItem {
    name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LyricResponse {
    code: Option<i64>,
    lrc: Option<LrcBody>,
}

#[derive(Deserialize, Debug)]
struct LrcBody {
    lyric: Option<String>,
}

impl From<SongItem> for SongRef {
    fn from(item: SongItem) -> Self {
        let id = match item.id {
            SongId::Number(n) => n.to_string(),
            SongId::Text(s) => s,
        };
        let artist = item
            .artists
            .into_iter()
            .filter_map(|a| a.name)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        SongRef {
            id,
            name: item.name.unwrap_or_default(),
            artist,
        }
    }
}

/// Catalog client for a NetEase-compatible music API (`/search`, `/lyric`)
#[derive(Clone)]
pub struct NeteaseClient {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    parser: LrcParser,
}

impl NeteaseClient {
    pub fn new(config: &Config) -> Result<Self, NetworkError> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("lyricchain v{}", version);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts.max(1),
            parser: LrcParser::new(config.metadata_labels.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn try_search(&self, keyword: &str, limit: usize) -> Result<Vec<SongRef>, NetworkError> {
        let limit_str = limit.to_string();
        let params = [("keywords", keyword), ("limit", limit_str.as_str())];
        let body = self.get_with_retry("search", &params).await?;
        decode_search(&body, limit)
    }

    async fn try_fetch_lyrics(&self, song_id: &str) -> Result<Vec<String>, NetworkError> {
        let body = self.get_with_retry("lyric", &[("id", song_id)]).await?;
        let raw = decode_lyric(&body)?;
        Ok(self.parser.parse(&raw))
    }

    /// GET `{base}/{endpoint}` with exponential backoff on transient failures
    async fn get_with_retry(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, NetworkError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match self.client.get(&url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        response.text().await.map_err(NetworkError::classify)
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        Err(NetworkError::RateLimit)
                    } else {
                        Err(NetworkError::Status { status })
                    }
                }
                Err(e) => Err(NetworkError::classify(e)),
            };

            match result {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let backoff = 2u64.pow(attempt - 1) * RETRY_BASE_MILLIS; // 300ms, 600ms, ...
                    debug!("{} attempt {} failed ({}), retrying in {}ms", endpoint, attempt, e, backoff);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CatalogClient for NeteaseClient {
    async fn search_candidates(&self, keyword: &str, limit: usize) -> Vec<SongRef> {
        let keyword = keyword.trim();
        if keyword.is_empty() || limit == 0 {
            return Vec::new();
        }

        info!("Searching catalog for: {}", keyword);
        match self.try_search(keyword, limit).await {
            Ok(songs) => {
                debug!("Catalog returned {} candidate(s) for {}", songs.len(), keyword);
                songs
            }
            Err(e) => {
                warn!("Catalog search failed for {}: {}", keyword, e);
                Vec::new()
            }
        }
    }

    async fn fetch_lyrics(&self, song_id: &str) -> Vec<String> {
        match self.try_fetch_lyrics(song_id).await {
            Ok(lines) => {
                debug!("Fetched {} lyric lines for song {}", lines.len(), song_id);
                lines
            }
            Err(e) => {
                warn!("Lyric fetch failed for song {}: {}", song_id, e);
                Vec::new()
            }
        }
    }
}

fn check_code(code: Option<i64>) -> Result<(), NetworkError> {
    match code {
        Some(code) if code != 200 => Err(NetworkError::InvalidResponse {
            reason: format!("API code {}", code),
        }),
        _ => Ok(()),
    }
}

fn decode_search(body: &str, limit: usize) -> Result<Vec<SongRef>, NetworkError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| NetworkError::InvalidResponse { reason: e.to_string() })?;
    check_code(response.code)?;

    Ok(response
        .result
        .map(|result| result.songs)
        .unwrap_or_default()
        .into_iter()
        .take(limit)
        .map(SongRef::from)
        .collect())
}

fn decode_lyric(body: &str) -> Result<String, NetworkError> {
    let response: LyricResponse = serde_json::from_str(body)
        .map_err(|e| NetworkError::InvalidResponse { reason: e.to_string() })?;
    check_code(response.code)?;

    Ok(response
        .lrc
        .and_then(|lrc| lrc.lyric)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_decode_search_songs() {
        let body = r#"{"code":200,"result":{"songs":[
            {"id":347230,"name":"海阔天空","artists":[{"name":"Beyond"}]},
            {"id":"42","name":"Duet","ar":[{"name":"A"},{"name":"B"}]}
        ]}}"#;

        let songs = decode_search(body, 5).unwrap();
        assert_eq!(
            songs,
            vec![
                SongRef { id: "347230".into(), name: "海阔天空".into(), artist: "Beyond".into() },
                SongRef { id: "42".into(), name: "Duet".into(), artist: "A/B".into() },
            ]
        );
        assert_eq!(decode_search(body, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_search_empty_and_malformed() {
        assert!(decode_search(r#"{"code":200,"result":{}}"#, 3).unwrap().is_empty());
        assert!(decode_search(r#"{"code":200}"#, 3).unwrap().is_empty());
        assert!(decode_search(r#"{"code":400,"result":{"songs":[]}}"#, 3).is_err());
        assert!(decode_search("<html>", 3).is_err());
    }

    #[test]
    fn test_decode_lyric() {
        let body = r#"{"code":200,"lrc":{"lyric":"[00:01.00]first\n[00:02.00]second"}}"#;
        assert_eq!(decode_lyric(body).unwrap(), "[00:01.00]first\n[00:02.00]second");
        assert_eq!(decode_lyric(r#"{"code":200,"nolyric":true}"#).unwrap(), "");
    }

    #[tokio::test]
    async fn test_unreachable_catalog_collapses_to_empty() {
        let config = ConfigBuilder::new()
            .api_base_url("http://127.0.0.1:9")
            .unwrap()
            .request_timeout_secs(2)
            .unwrap()
            .max_attempts(1)
            .unwrap()
            .build()
            .unwrap();
        let client = NeteaseClient::new(&config).unwrap();

        assert!(client.search("任何歌词").await.is_none());
        assert!(client.fetch_lyrics("1").await.is_empty());
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let config = ConfigBuilder::new()
            .api_base_url("http://localhost:3000/")
            .unwrap()
            .build()
            .unwrap();
        let client = NeteaseClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
