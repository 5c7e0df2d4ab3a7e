//! Configuration module
//!
//! A [`Config`] names the container and prefix to use and carries everything the
//! client needs to reach the service. It is built from a location string of the form
//! `swift:///<container>[/<prefix>]`, optionally from a TOML file, and then completed
//! from the usual OpenStack environment variables.

use crate::{Error, ParseError, Result};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default number of concurrent data transfers
pub const DEFAULT_CONNECTIONS: usize = 10;

/// Default connect and request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the storage policy for newly created containers
pub const CONTAINER_POLICY_ENV: &str = "SWIFT_DEFAULT_CONTAINER_POLICY";

/// Backend configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User name
    pub user_name: String,
    /// User domain (v3)
    pub domain: String,
    /// Password or API key
    pub api_key: String,
    /// Identity endpoint
    pub auth_url: String,
    /// Region name
    pub region: String,
    /// Tenant / project name
    pub tenant: String,
    /// Tenant / project id (v2)
    pub tenant_id: String,
    /// Project domain (v3)
    pub tenant_domain: String,
    /// Trust id (v3)
    pub trust_id: String,

    /// Storage URL for manual authentication
    pub storage_url: String,
    /// Token for manual authentication
    pub auth_token: String,

    /// Container holding all objects
    pub container: String,
    /// Prefix of object names inside the container
    pub prefix: String,
    /// Storage policy applied when the container has to be created
    pub default_container_policy: String,

    /// Maximum number of concurrent loads and saves
    pub connections: usize,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            domain: String::new(),
            api_key: String::new(),
            auth_url: String::new(),
            region: String::new(),
            tenant: String::new(),
            tenant_id: String::new(),
            tenant_domain: String::new(),
            trust_id: String::new(),
            storage_url: String::new(),
            auth_token: String::new(),
            container: String::new(),
            prefix: String::new(),
            default_container_policy: String::new(),
            connections: DEFAULT_CONNECTIONS,
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("user_name", &self.user_name)
            .field("domain", &self.domain)
            .field("api_key", &redact(&self.api_key))
            .field("auth_url", &self.auth_url)
            .field("region", &self.region)
            .field("tenant", &self.tenant)
            .field("tenant_id", &self.tenant_id)
            .field("tenant_domain", &self.tenant_domain)
            .field("trust_id", &self.trust_id)
            .field("storage_url", &self.storage_url)
            .field("auth_token", &redact(&self.auth_token))
            .field("container", &self.container)
            .field("prefix", &self.prefix)
            .field("default_container_policy", &self.default_container_policy)
            .field("connections", &self.connections)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Environment variables consulted for each field, in order. A field is only filled
/// while it is still empty, so earlier entries win over later ones.
const ENVIRONMENT: &[(Field, &str)] = &[
    // v2/v3
    (Field::UserName, "OS_USERNAME"),
    (Field::ApiKey, "OS_PASSWORD"),
    (Field::Region, "OS_REGION_NAME"),
    (Field::AuthUrl, "OS_AUTH_URL"),
    // v3
    (Field::Domain, "OS_USER_DOMAIN_NAME"),
    (Field::Tenant, "OS_PROJECT_NAME"),
    (Field::TenantDomain, "OS_PROJECT_DOMAIN_NAME"),
    // v2
    (Field::TenantId, "OS_TENANT_ID"),
    (Field::Tenant, "OS_TENANT_NAME"),
    // v1
    (Field::AuthUrl, "ST_AUTH"),
    (Field::UserName, "ST_USER"),
    (Field::ApiKey, "ST_KEY"),
    // manual authentication
    (Field::StorageUrl, "OS_STORAGE_URL"),
    (Field::AuthToken, "OS_AUTH_TOKEN"),
    (Field::DefaultContainerPolicy, CONTAINER_POLICY_ENV),
];

#[derive(Debug, Clone, Copy)]
enum Field {
    UserName,
    ApiKey,
    Region,
    AuthUrl,
    Domain,
    Tenant,
    TenantDomain,
    TenantId,
    StorageUrl,
    AuthToken,
    DefaultContainerPolicy,
}

impl Config {
    /// Parse a location string like `swift:///container/prefix`.
    ///
    /// Only the container and prefix are set; credentials stay empty. The path is
    /// percent-decoded, so the prefix is the text the user wrote.
    pub fn parse(location: &str) -> Result<Self> {
        let url = Url::parse(location)
            .map_err(|e| ParseError::InvalidUrl(format!("{}: {}", location, e)))?;

        if let Some(host) = url.host_str() {
            if !host.is_empty() {
                return Err(ParseError::HostNotSupported(host.to_string()).into());
            }
        }

        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|e| ParseError::InvalidUrl(format!("{}: {}", location, e)))?;

        let parts: Vec<&str> = path.splitn(3, '/').collect();
        if parts.len() < 2 || parts[1].is_empty() {
            return Err(ParseError::MissingContainer.into());
        }

        Ok(Self {
            container: parts[1].to_string(),
            prefix: parts.get(2).map(|p| p.to_string()).unwrap_or_default(),
            ..Self::default()
        })
    }

    /// Parse `location` and complete it from the process environment.
    pub fn resolve(location: &str) -> Result<Self> {
        Ok(Self::parse(location)?.apply_environment(|name| std::env::var(name).ok()))
    }

    /// Fill every empty credential field from `lookup`.
    ///
    /// Values that are already set are never replaced, and empty variables count as unset.
    pub fn apply_environment<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, name) in ENVIRONMENT {
            let slot = self.field_mut(*field);
            if !slot.is_empty() {
                continue;
            }
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
        self
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::UserName => &mut self.user_name,
            Field::ApiKey => &mut self.api_key,
            Field::Region => &mut self.region,
            Field::AuthUrl => &mut self.auth_url,
            Field::Domain => &mut self.domain,
            Field::Tenant => &mut self.tenant,
            Field::TenantDomain => &mut self.tenant_domain,
            Field::TenantId => &mut self.tenant_id,
            Field::StorageUrl => &mut self.storage_url,
            Field::AuthToken => &mut self.auth_token,
            Field::DefaultContainerPolicy => &mut self.default_container_policy,
        }
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check the invariants a backend relies on
    pub fn validate(&self) -> Result<()> {
        if self.container.is_empty() {
            return Err(ParseError::MissingContainer.into());
        }
        if self.connections == 0 {
            return Err(Error::Config("connections must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Credentials handed to the client
    pub fn credentials(&self) -> Credentials {
        Credentials {
            user_name: self.user_name.clone(),
            domain: self.domain.clone(),
            api_key: self.api_key.clone(),
            auth_url: self.auth_url.clone(),
            region: self.region.clone(),
            tenant: self.tenant.clone(),
            tenant_id: self.tenant_id.clone(),
            tenant_domain: self.tenant_domain.clone(),
            trust_id: self.trust_id.clone(),
            storage_url: self.storage_url.clone(),
            auth_token: self.auth_token.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Connection parameters derived from a [`Config`]
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub user_name: String,
    /// User domain (v3)
    pub domain: String,
    /// Password or API key
    pub api_key: String,
    /// Identity endpoint
    pub auth_url: String,
    /// Region name
    pub region: String,
    /// Tenant / project name
    pub tenant: String,
    /// Tenant / project id (v2)
    pub tenant_id: String,
    /// Project domain (v3)
    pub tenant_domain: String,
    /// Trust id (v3)
    pub trust_id: String,
    /// Storage URL, set together with `auth_token` to skip authentication
    pub storage_url: String,
    /// Pre-obtained token
    pub auth_token: String,
    /// Time allowed for establishing a connection
    pub connect_timeout: Duration,
    /// Time allowed for a whole request
    pub timeout: Duration,
}

impl Credentials {
    /// Storage URL and token are both known, no authentication round trip needed
    pub fn is_preauthenticated(&self) -> bool {
        !self.storage_url.is_empty() && !self.auth_token.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("auth_url", &self.auth_url)
            .field("api_key", &redact(&self.api_key))
            .field("storage_url", &self.storage_url)
            .field("auth_token", &redact(&self.auth_token))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
