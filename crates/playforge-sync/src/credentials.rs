//! One-off push credentials

use crate::error::SyncError;
use std::fmt;

const REDACTED: &str = "***";

/// Username and secret for an authenticated push
///
/// The secret never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    /// # Errors
    /// Returns `SyncError::MissingCredential` if either field is blank
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Result<Self, SyncError> {
        let username = username.into().trim().to_string();
        let secret = secret.into().trim().to_string();
        if username.is_empty() {
            return Err(SyncError::MissingCredential("username"));
        }
        if secret.is_empty() {
            return Err(SyncError::MissingCredential("password/token"));
        }
        Ok(Self { username, secret })
    }

    #[inline]
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Embed the credentials into an `https://domain/path` URL
    ///
    /// Username and secret are percent-encoded. Other URL forms are returned
    /// unchanged.
    #[must_use]
    pub fn authenticated_url(&self, url: &str) -> String {
        match url.strip_prefix("https://").and_then(|rest| rest.split_once('/')) {
            Some((domain, path)) => format!(
                "https://{}:{}@{domain}/{path}",
                urlencoding::encode(&self.username),
                urlencoding::encode(&self.secret)
            ),
            None => url.to_string(),
        }
    }

    /// Replace every occurrence of the secret, raw or percent-encoded, in `text`
    #[must_use]
    pub fn scrub(&self, text: &str) -> String {
        let encoded = urlencoding::encode(&self.secret);
        text.replace(&self.secret, REDACTED)
            .replace(encoded.as_ref(), REDACTED)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &REDACTED)
            .finish()
    }
}
