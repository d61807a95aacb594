//! Telegram webhook secret token authentication.

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Header Telegram sets on every webhook delivery when the webhook was
/// registered with a `secret_token`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Authenticator that compares the webhook secret header against the
/// configured token.
pub struct SecretTokenAuthenticator {
    expected_token: String,
}

impl SecretTokenAuthenticator {
    pub fn new(secret_token: String) -> Self {
        Self {
            expected_token: secret_token,
        }
    }
}

#[async_trait]
impl Authenticator for SecretTokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided = request
            .headers
            .get(SECRET_TOKEN_HEADER)
            .ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(provided.as_bytes(), self.expected_token.as_bytes()) {
            Ok(Identity::telegram())
        } else {
            Err(AuthError::InvalidCredentials(
                "Invalid webhook secret token".to_string(),
            ))
        }
    }

    fn method_name(&self) -> &'static str {
        "secret_token"
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
