use crate::sdk::session::Session;
use reqwest::{header::AUTHORIZATION, Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{action} failed ({status}){}", detail(.description))]
    Rejected {
        action: &'static str,
        status: u16,
        description: Option<String>,
    },

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn detail(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Sent lowercase; the backend answers with the uppercase enum name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[serde(alias = "DRIVER")]
    Driver,
    #[default]
    #[serde(alias = "PASSENGER")]
    Passenger,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Driver => f.write_str("driver"),
            UserRole::Passenger => f.write_str("passenger"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driver" => Ok(UserRole::Driver),
            "passenger" => Ok(UserRole::Passenger),
            other => Err(format!("unknown role \"{other}\"")),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub dni: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub dni: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the backend's `/api/users` endpoints.
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/users{}", self.base_url, path)
    }

    pub async fn login(
        &self,
        session: &mut Session,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        log::debug!("[AUTH] Logging in {}", email);
        let response = self
            .client
            .post(self.url("/login"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        let response = check(response, "Login").await?;
        let body: TokenResponse = serde_json::from_str(&response.text().await?)?;
        session.sign_in(email, body.token);
        log::info!("Logged in as {}", email);
        Ok(())
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(&self, session: &mut Session, user: &NewUser) -> Result<User, AuthError> {
        log::debug!("[AUTH] Registering {} as {}", user.email, user.role);
        let response = self.client.post(self.url("")).json(user).send().await?;
        let response = check(response, "Registration").await?;
        let created: User = serde_json::from_str(&response.text().await?)?;
        self.login(session, &user.email, &user.password).await?;
        Ok(created)
    }

    /// Invalidates the token server-side. The session is cleared whatever the outcome.
    pub async fn logout(&self, session: &mut Session) -> Result<(), AuthError> {
        let Some(bearer) = session.bearer() else {
            log::debug!("[AUTH] Logout without a session, nothing to do");
            return Ok(());
        };
        let result: Result<(), AuthError> = async {
            let response = self
                .client
                .post(self.url("/logout"))
                .header(AUTHORIZATION, bearer)
                .send()
                .await?;
            check(response, "Logout").await.map(|_| ())
        }
        .await;
        session.clear();
        if let Err(e) = &result {
            log::warn!("Logout call failed, session cleared anyway: {}", e);
        }
        result
    }
}

async fn check(response: Response, action: &'static str) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let description = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.description.or(body.error))
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()));
    log::error!("{} rejected with {}: {}", action, status, text);
    Err(AuthError::Rejected {
        action,
        status: status.as_u16(),
        description,
    })
}
