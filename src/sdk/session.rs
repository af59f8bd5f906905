use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, io::Result as IoResult, path::Path, path::PathBuf};

/// The signed-in user's credentials, handed explicitly to whatever needs them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    email: Option<String>,
    logged_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.logged_in_at
    }

    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }

    pub fn sign_in(&mut self, email: &str, token: String) {
        self.token = Some(token);
        self.email = Some(email.to_string());
        self.logged_in_at = Some(Utc::now());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// File-backed persistence for a [`Session`], loaded at start-up and saved on exit.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> IoResult<Session> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Session::default())
        }
    }

    /// Writes the session; a signed-out session removes the file instead.
    pub fn save(&self, session: &Session) -> IoResult<()> {
        if !session.is_logged_in() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        let data = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, data)
    }
}
