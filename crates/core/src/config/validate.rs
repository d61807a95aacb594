use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Secret token present when `auth.method = "secret_token"`
/// - Telegram bot token and GitHub token are non-empty
/// - GitHub repo has the form "owner/name"
/// - Size limits and cache capacity are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.auth.method == AuthMethod::SecretToken
        && config
            .auth
            .secret_token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
    {
        return Err(invalid(
            "auth.secret_token is required when auth.method is \"secret_token\"",
        ));
    }

    if config.telegram.bot_token.trim().is_empty() {
        return Err(invalid("telegram.bot_token cannot be empty"));
    }
    if config.telegram.max_file_size_bytes == 0 {
        return Err(invalid("telegram.max_file_size_bytes must be positive"));
    }
    if config.telegram.timeout_secs == 0 {
        return Err(invalid("telegram.timeout_secs must be positive"));
    }

    if config.github.token.trim().is_empty() {
        return Err(invalid("github.token cannot be empty"));
    }
    if !is_owner_repo(&config.github.repo) {
        return Err(ConfigError::ValidationError(format!(
            "github.repo must be \"owner/name\", got \"{}\"",
            config.github.repo
        )));
    }
    if config.github.branch.trim().is_empty() {
        return Err(invalid("github.branch cannot be empty"));
    }
    if config.github.catalog_path.trim().is_empty() {
        return Err(invalid("github.catalog_path cannot be empty"));
    }
    if config.github.timeout_secs == 0 {
        return Err(invalid("github.timeout_secs must be positive"));
    }

    if config.dedup.capacity == 0 {
        return Err(invalid("dedup.capacity must be positive"));
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

fn is_owner_repo(repo: &str) -> bool {
    let mut parts = repo.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[auth]
method = "none"

[telegram]
bot_token = "123:abc"

[github]
repo = "owner/catalog"
token = "ghp_x"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_secret_token_required() {
        let mut config = valid_config();
        config.auth.method = AuthMethod::SecretToken;
        assert!(validate_config(&config).is_err());

        config.auth.secret_token = Some("  ".to_string());
        assert!(validate_config(&config).is_err());

        config.auth.secret_token = Some("s3cret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_repo_format() {
        for bad in ["", "owner", "owner/", "/name", "a/b/c"] {
            let mut config = valid_config();
            config.github.repo = bad.to_string();
            assert!(validate_config(&config).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_validate_empty_tokens_fail() {
        let mut config = valid_config();
        config.telegram.bot_token = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.github.token = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_limits_fail() {
        let mut config = valid_config();
        config.dedup.capacity = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.telegram.max_file_size_bytes = 0;
        assert!(validate_config(&config).is_err());
    }
}
