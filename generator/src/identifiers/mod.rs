//! Identifier source.
//!
//! PIDs come from the repository's `getNextPID` service, either live or
//! from a response saved by an earlier run. Either way the batch gets one
//! ordered list up front and pops from the front of it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xmlgen::identifiers::{PidClient, RegistryServer};
//!
//! let client = PidClient::from_env(RegistryServer::Stage)?;
//! let response = client.fetch(12).await?;
//! std::fs::write("pids.xml", &response.raw)?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{IdentifierError, IdentifierResult};
use crate::logs::{log_info, log_success};
use crate::models::Identifier;

/// Namespace requested from the registry.
pub const DEFAULT_NAMESPACE: &str = "umd";

/// Credential variables read by [`PidClient::from_env`].
pub const USERNAME_VAR: &str = "FEDORA_USERNAME";
pub const PASSWORD_VAR: &str = "FEDORA_PASSWORD";

static PID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<pid>(.*?)</pid>").expect("valid pid pattern"));

// =============================================================================
// Parsing saved responses
// =============================================================================

/// Extract identifiers from a registry response, in order.
///
/// Files without any `<pid>` element are read as one identifier per line.
pub fn parse_pid_response(text: &str) -> Vec<Identifier> {
    let tagged: Vec<Identifier> = PID_RE
        .captures_iter(text)
        .map(|caps| Identifier::new(&caps[1]))
        .filter(|id| !id.as_str().is_empty())
        .collect();

    if !tagged.is_empty() || text.contains("<pid") {
        return tagged;
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Identifier::new)
        .collect()
}

/// Read and parse a saved PID file.
pub fn load_pid_file(path: impl AsRef<Path>) -> IdentifierResult<Vec<Identifier>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let identifiers = parse_pid_response(&text);
    log_success(format!(
        "Loaded {} PIDs from {}",
        identifiers.len(),
        path.as_ref().display()
    ));
    Ok(identifiers)
}

// =============================================================================
// Queue
// =============================================================================

/// Pre-fetched identifiers, consumed front to back and never reused.
#[derive(Debug, Clone, Default)]
pub struct IdentifierQueue {
    pending: VecDeque<Identifier>,
    consumed: usize,
}

impl IdentifierQueue {
    pub fn new(identifiers: Vec<Identifier>) -> Self {
        Self {
            pending: identifiers.into(),
            consumed: 0,
        }
    }

    /// Fail unless at least `required` identifiers remain.
    pub fn ensure(&self, required: usize) -> IdentifierResult<()> {
        if self.pending.len() < required {
            return Err(IdentifierError::Insufficient {
                required,
                available: self.pending.len(),
            });
        }
        Ok(())
    }

    /// Take the next identifier.
    pub fn next_id(&mut self) -> Option<Identifier> {
        let id = self.pending.pop_front()?;
        self.consumed += 1;
        Some(id)
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

// =============================================================================
// Registry client
// =============================================================================

/// Which repository instance to reserve PIDs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryServer {
    Stage,
    Production,
}

impl RegistryServer {
    pub fn base_url(&self) -> &'static str {
        match self {
            RegistryServer::Stage => "http://fedorastage.lib.umd.edu/fedora",
            RegistryServer::Production => "http://fedora.lib.umd.edu/fedora",
        }
    }
}

impl FromStr for RegistryServer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "stage" => Ok(Self::Stage),
            "p" | "prod" | "production" => Ok(Self::Production),
            other => Err(format!("unknown server '{}' (expected stage or production)", other)),
        }
    }
}

impl fmt::Display for RegistryServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryServer::Stage => f.write_str("stage"),
            RegistryServer::Production => f.write_str("production"),
        }
    }
}

/// Raw registry answer plus the identifiers parsed from it.
#[derive(Debug, Clone)]
pub struct PidResponse {
    pub raw: String,
    pub identifiers: Vec<Identifier>,
}

/// Client for the `getNextPID` management endpoint.
#[derive(Clone)]
pub struct PidClient {
    server: RegistryServer,
    username: String,
    password: String,
    namespace: String,
}

impl PidClient {
    /// Create a client with explicit credentials
    pub fn new(server: RegistryServer, username: String, password: String) -> Self {
        Self {
            server,
            username,
            password,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Create a client from `FEDORA_USERNAME` / `FEDORA_PASSWORD`
    pub fn from_env(server: RegistryServer) -> IdentifierResult<Self> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let username = env::var(USERNAME_VAR)
            .map_err(|_| IdentifierError::MissingCredentials(format!("{} not set", USERNAME_VAR)))?;
        let password = env::var(PASSWORD_VAR)
            .map_err(|_| IdentifierError::MissingCredentials(format!("{} not set", PASSWORD_VAR)))?;

        Ok(Self::new(server, username, password))
    }

    /// Set the PID namespace
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Endpoint for reserving `count` PIDs.
    pub fn request_url(&self, count: usize) -> String {
        format!(
            "{}/management/getNextPID?numPids={}&namespace={}&xml=true",
            self.server.base_url(),
            count,
            self.namespace
        )
    }

    /// Reserve `count` PIDs.
    pub async fn fetch(&self, count: usize) -> IdentifierResult<PidResponse> {
        log_info(format!("Requesting {} PIDs from {}...", count, self.server));

        let response = reqwest::Client::new()
            .get(self.request_url(count))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| IdentifierError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| IdentifierError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(IdentifierError::ServerError(format!("HTTP {}: {}", status, raw)));
        }

        let identifiers = parse_pid_response(&raw);
        if identifiers.len() < count {
            return Err(IdentifierError::Insufficient {
                required: count,
                available: identifiers.len(),
            });
        }

        log_success(format!("Received {} PIDs", identifiers.len()));
        Ok(PidResponse { raw, identifiers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pidList xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <pid>umd:1001</pid>
  <pid>umd:1002</pid>
  <pid>umd:1003</pid>
</pidList>"#;

    #[test]
    fn test_parse_registry_response() {
        let ids = parse_pid_response(RESPONSE);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0].as_str(), "umd:1001");
        assert_eq!(ids[2].as_str(), "umd:1003");
    }

    #[test]
    fn test_parse_plain_list() {
        let ids = parse_pid_response("umd:1\n\n  umd:2 \n");
        assert_eq!(ids, vec![Identifier::new("umd:1"), Identifier::new("umd:2")]);
    }

    #[test]
    fn test_parse_empty_pid_list() {
        // An XML answer without PIDs must not be read line by line
        assert!(parse_pid_response("<pidList>\n</pidList>").is_empty());
        assert!(parse_pid_response("<pid></pid>").is_empty());
    }

    #[test]
    fn test_load_pid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RESPONSE.as_bytes()).unwrap();

        let ids = load_pid_file(file.path()).unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_queue_order_and_count() {
        let mut queue = IdentifierQueue::new(parse_pid_response(RESPONSE));
        assert!(queue.ensure(3).is_ok());
        assert_eq!(queue.next_id().unwrap().as_str(), "umd:1001");
        assert_eq!(queue.next_id().unwrap().as_str(), "umd:1002");
        assert_eq!(queue.consumed(), 2);
        assert_eq!(queue.remaining(), 1);
    }

    #[test]
    fn test_queue_insufficient() {
        let queue = IdentifierQueue::new(vec![Identifier::new("umd:1"), Identifier::new("umd:2")]);
        let err = queue.ensure(3).unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::Insufficient { required: 3, available: 2 }
        ));
    }

    #[test]
    fn test_request_url() {
        let client = PidClient::new(RegistryServer::Stage, "u".into(), "p".into());
        assert_eq!(
            client.request_url(4),
            "http://fedorastage.lib.umd.edu/fedora/management/getNextPID?numPids=4&namespace=umd&xml=true"
        );
    }

    #[test]
    fn test_request_url_namespace() {
        let client = PidClient::new(RegistryServer::Production, "u".into(), "p".into())
            .with_namespace("test");
        assert!(client.request_url(1).ends_with("numPids=1&namespace=test&xml=true"));
        assert!(client.request_url(1).starts_with("http://fedora.lib.umd.edu/fedora/"));
    }

    #[test]
    fn test_server_from_str() {
        assert_eq!("P".parse::<RegistryServer>().unwrap(), RegistryServer::Production);
        assert_eq!("stage".parse::<RegistryServer>().unwrap(), RegistryServer::Stage);
        assert!("dev".parse::<RegistryServer>().is_err());
    }
}
