mod none;
mod secret_token;
mod traits;
mod types;

pub use none::*;
pub use secret_token::*;
pub use traits::*;
pub use types::*;

use crate::config::AuthConfig;

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    use crate::config::AuthMethod;

    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::SecretToken => {
            let token = config
                .secret_token
                .clone()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "secret_token must be set when using SecretToken auth method".to_string(),
                    )
                })?;
            Ok(Box::new(SecretTokenAuthenticator::new(token)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMethod;

    #[test]
    fn test_create_authenticator_none() {
        let config = AuthConfig {
            method: AuthMethod::None,
            secret_token: None,
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_secret_token() {
        let config = AuthConfig {
            method: AuthMethod::SecretToken,
            secret_token: Some("s3cret".to_string()),
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "secret_token");
    }

    #[test]
    fn test_create_authenticator_secret_token_missing() {
        let config = AuthConfig {
            method: AuthMethod::SecretToken,
            secret_token: None,
        };
        let result = create_authenticator(&config);
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));

        let config = AuthConfig {
            method: AuthMethod::SecretToken,
            secret_token: Some(String::new()),
        };
        assert!(create_authenticator(&config).is_err());
    }
}
