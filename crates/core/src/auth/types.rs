use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;

/// Request information for authentication. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Caller identity attached to an authenticated webhook request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }

    /// Delivery carrying the bot's webhook secret.
    pub fn telegram() -> Self {
        Self {
            subject: "telegram".to_string(),
            method: "secret_token".to_string(),
        }
    }
}
