//! Moves API client.
//!
//! Handles:
//! - Building the OAuth authorization URL
//! - Exchanging an authorization code for an access token
//! - Fetching daily storylines with track points

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use time::macros::format_description;
use time::Date;

use crate::error::{Error, Result};
use crate::storyline::DailySummary;

pub const DEFAULT_BASE_URL: &str = "https://api.moves-app.com";

const SCOPES: &str = "activity location";

/// The parts of the Moves API the exporter talks to.
pub trait MovesApi {
    fn authorize_url(&self, client_id: &str) -> String;

    /// Exchanges an authorization code for an access token.
    fn exchange_code(&self, client_id: &str, client_secret: &str, code: &str) -> Result<String>;

    /// Fetches the storyline for a single day, track points included.
    fn daily_storyline(&self, access_token: &str, date: Date) -> Result<Vec<Option<DailySummary>>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    user_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ReqwestMovesClient {
    http: Client,
    base_url: String,
}

impl ReqwestMovesClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Return an error for any non-success response.
    fn check_response(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Moves rate limit hit (429), consider a longer --wait");
            }
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Access token rejected (401)");
                body.push_str(" (clear access_token in the config file to authorize again)");
            }
            _ => {}
        }

        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }
}

impl MovesApi for ReqwestMovesClient {
    fn authorize_url(&self, client_id: &str) -> String {
        format!(
            "{}/oauth/v1/authorize?response_type=code&client_id={}&scope={}",
            self.base_url,
            urlencoding::encode(client_id),
            urlencoding::encode(SCOPES),
        )
    }

    fn exchange_code(&self, client_id: &str, client_secret: &str, code: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/oauth/v1/access_token", self.base_url))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::TokenExchange {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let token: TokenResponse = serde_json::from_str(&response.text()?)?;
        tracing::debug!(
            expires_in = ?token.expires_in,
            user_id = ?token.user_id,
            "Obtained access token"
        );
        Ok(token.access_token)
    }

    fn daily_storyline(&self, access_token: &str, date: Date) -> Result<Vec<Option<DailySummary>>> {
        let day = date.format(format_description!("[year]-[month]-[day]"))?;
        let url = format!("{}/api/v1/user/storyline/daily/{}", self.base_url, day);
        tracing::debug!(%url, "Fetching storyline");

        let response = self
            .http
            .get(&url)
            .query(&[("trackPoints", "true"), ("access_token", access_token)])
            .send()?;

        let body = Self::check_response(response)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
