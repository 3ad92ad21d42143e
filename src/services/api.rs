use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{AccountId, MatchId, MatchRecord, PlayerIdentity};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

const USER_AGENT: &str = concat!("tft-match-stats/", env!("CARGO_PKG_VERSION"));
const RIOT_TOKEN_HEADER: &str = "X-Riot-Token";

/// Remote match-data service. Implementations make exactly one request per
/// call and never retry.
pub trait MatchApi {
    /// May return an empty id; the caller decides what that means.
    fn resolve_identity(&self, identity: &PlayerIdentity) -> Result<AccountId>;

    /// Most recent first, at most `count` entries.
    fn list_recent_matches(&self, account_id: &AccountId, count: u32) -> Result<Vec<MatchId>>;

    fn fetch_match(&self, match_id: &MatchId) -> Result<MatchRecord>;
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    #[serde(default)]
    puuid: String,
}

pub struct RiotClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl RiotClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            Error::Config(format!("invalid API base url '{}': {e}", settings.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "API base url '{}' cannot carry a path",
                settings.base_url
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.riot_api_key.clone(),
        })
    }

    /// Appends percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> Result<Response> {
        let endpoint = url.path().to_string();
        tracing::debug!(%endpoint, "GET");

        let response = self
            .http
            .get(url)
            .header(RIOT_TOKEN_HEADER, &self.api_key)
            .send()
            .map_err(|e| Error::remote(&endpoint, None, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(Error::remote(&endpoint, Some(status.as_u16()), reason));
        }
        Ok(response)
    }
}

impl MatchApi for RiotClient {
    fn resolve_identity(&self, identity: &PlayerIdentity) -> Result<AccountId> {
        let url = self.endpoint(&[
            "riot",
            "account",
            "v1",
            "accounts",
            "by-riot-id",
            &identity.game_name,
            &identity.tag_line,
        ]);
        let endpoint = url.path().to_string();

        let response = match self.get(url) {
            Err(Error::Remote {
                status: Some(404), ..
            }) => {
                return Err(Error::IdentityNotFound {
                    game_name: identity.game_name.clone(),
                    tag_line: identity.tag_line.clone(),
                })
            }
            other => other?,
        };

        let account: AccountDto = response
            .json()
            .map_err(|e| Error::remote(&endpoint, None, format!("invalid account body: {e}")))?;
        Ok(AccountId::new(account.puuid))
    }

    fn list_recent_matches(&self, account_id: &AccountId, count: u32) -> Result<Vec<MatchId>> {
        let mut url = self.endpoint(&[
            "tft",
            "match",
            "v1",
            "matches",
            "by-puuid",
            account_id.as_str(),
            "ids",
        ]);
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        let endpoint = url.path().to_string();

        let ids: Vec<MatchId> = self
            .get(url)?
            .json()
            .map_err(|e| Error::remote(&endpoint, None, format!("invalid match list: {e}")))?;
        Ok(ids.into_iter().take(count as usize).collect())
    }

    fn fetch_match(&self, match_id: &MatchId) -> Result<MatchRecord> {
        let url = self.endpoint(&["tft", "match", "v1", "matches", match_id.as_str()]);
        let endpoint = url.path().to_string();

        let response = self.get(url)?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(Error::remote(&endpoint, Some(204), "empty match body"));
        }
        let bytes = response
            .bytes()
            .map_err(|e| Error::remote(&endpoint, None, e.without_url().to_string()))?;
        MatchRecord::from_bytes(bytes.to_vec())
            .map_err(|e| Error::remote(&endpoint, None, format!("invalid match body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn settings(base_url: &str) -> Settings {
        Settings {
            riot_api_key: "RGAPI-test".to_string(),
            base_url: base_url.to_string(),
            data_dir: "data".into(),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Serves a single canned HTTP response and reports the request head.
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            let _ = tx.send(head);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        (format!("http://{addr}"), rx)
    }

    #[test]
    fn endpoint_encodes_riot_id_segments() {
        let client = RiotClient::new(&settings("https://americas.api.riotgames.com")).unwrap();
        let url = client.endpoint(&["riot", "account", "v1", "accounts", "by-riot-id", "Manon Win", "236KK"]);
        assert_eq!(
            url.as_str(),
            "https://americas.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Manon%20Win/236KK"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(matches!(
            RiotClient::new(&settings("not a url")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn resolve_identity_sends_token_and_reads_puuid() {
        let (base, head) = serve_once("200 OK", r#"{"puuid":"P123","gameName":"Foo","tagLine":"000"}"#);
        let client = RiotClient::new(&settings(&base)).unwrap();

        let id = client.resolve_identity(&PlayerIdentity::new("Foo", "000")).unwrap();
        assert_eq!(id, AccountId::new("P123"));

        let head = head.recv().unwrap().to_lowercase();
        assert!(head.starts_with("get /riot/account/v1/accounts/by-riot-id/foo/000 "));
        assert!(head.contains("x-riot-token: rgapi-test"));
    }

    #[test]
    fn missing_puuid_resolves_to_empty_id() {
        let (base, _head) = serve_once("200 OK", r#"{"gameName":"Foo"}"#);
        let client = RiotClient::new(&settings(&base)).unwrap();
        let id = client.resolve_identity(&PlayerIdentity::new("Foo", "000")).unwrap();
        assert!(id.is_empty());
    }

    #[test]
    fn unknown_player_is_identity_not_found() {
        let (base, _head) = serve_once("404 Not Found", r#"{"status":{"status_code":404}}"#);
        let client = RiotClient::new(&settings(&base)).unwrap();
        let err = client.resolve_identity(&PlayerIdentity::new("Nobody", "000")).unwrap_err();
        assert!(matches!(err, Error::IdentityNotFound { .. }));
    }

    #[test]
    fn list_recent_matches_passes_count() {
        let (base, head) = serve_once("200 OK", r#"["m1","m2"]"#);
        let client = RiotClient::new(&settings(&base)).unwrap();

        let ids = client.list_recent_matches(&AccountId::new("P123"), 2).unwrap();
        assert_eq!(ids, vec![MatchId::new("m1").unwrap(), MatchId::new("m2").unwrap()]);
        assert!(head
            .recv()
            .unwrap()
            .starts_with("GET /tft/match/v1/matches/by-puuid/P123/ids?count=2 "));
    }

    #[test]
    fn zero_matches_is_empty_not_error() {
        let (base, _head) = serve_once("200 OK", "[]");
        let client = RiotClient::new(&settings(&base)).unwrap();
        assert!(client
            .list_recent_matches(&AccountId::new("P123"), 20)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn non_success_status_is_remote_error() {
        let (base, _head) = serve_once("429 Too Many Requests", "{}");
        let client = RiotClient::new(&settings(&base)).unwrap();
        let err = client.fetch_match(&MatchId::new("NA1_1").unwrap()).unwrap_err();
        match err {
            Error::Remote { endpoint, status, .. } => {
                assert_eq!(endpoint, "/tft/match/v1/matches/NA1_1");
                assert_eq!(status, Some(429));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fetch_match_keeps_body_bytes() {
        let body = r#"{"info":{"participants":[{"puuid":"P123","placement":2}]}}"#;
        let (base, _head) = serve_once("200 OK", body);
        let client = RiotClient::new(&settings(&base)).unwrap();
        let record = client.fetch_match(&MatchId::new("NA1_1").unwrap()).unwrap();
        assert_eq!(record.bytes(), body.as_bytes());
    }

    #[test]
    fn connection_failure_is_remote_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RiotClient::new(&settings(&format!("http://{addr}"))).unwrap();
        let err = client.fetch_match(&MatchId::new("NA1_1").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Remote { status: None, .. }));
    }
}
