//! Service URL abstraction.
//!
//! # Responsibilities
//! - Describe both sides of a call (consumer and provider) as one type
//! - Expose authority (host, port), path (service identity) and query params
//! - Typed parameter accessors with defaults
//!
//! # Design Decisions
//! - Parsing delegates to the `url` crate; the parsed value is flattened into
//!   owned fields so lookups never re-parse
//! - Params are kept in a BTreeMap so `Display` output is deterministic
//! - Port is kept in string form; an absent port is the empty string

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Error raised when text cannot be parsed as a service URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid url {input:?}: {source}")]
pub struct UrlError {
    pub input: String,
    #[source]
    pub source: url::ParseError,
}

/// Address and identity of one side of an RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceUrl {
    protocol: String,
    host: String,
    port: String,
    path: String,
    params: BTreeMap<String, String>,
}

impl ServiceUrl {
    /// Build a URL without params from its parts.
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port: String::new(),
            path: path.into().trim_start_matches('/').to_string(),
            params: BTreeMap::new(),
        }
    }

    /// Parse a URL such as `dubbo://10.20.3.3:20880/com.foo.BarService?methods=getFoo`.
    ///
    /// Blank input yields the blank URL.
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }

        let parsed = Url::parse(input).map_err(|source| UrlError {
            input: input.to_string(),
            source,
        })?;

        let params = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            protocol: parsed.scheme().to_string(),
            host: parsed.host_str().unwrap_or_default().to_string(),
            port: parsed.port().map(|p| p.to_string()).unwrap_or_default(),
            path: parsed.path().trim_start_matches('/').to_string(),
            params,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Path without the leading slash; by convention the service interface.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Raw query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    /// Boolean parameter; missing or unparseable values yield `default`.
    pub fn param_bool(&self, key: &str, default: bool) -> bool {
        self.param(key)
            .and_then(|v| v.trim().to_ascii_lowercase().parse().ok())
            .unwrap_or(default)
    }

    /// Integer parameter; missing or unparseable values yield `default`.
    pub fn param_i64(&self, key: &str, default: i64) -> i64 {
        self.param(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(key, value);
        self
    }

    /// The service interface: the `interface` param, else the path.
    pub fn interface(&self) -> &str {
        match self.param("interface") {
            Some(iface) if !iface.is_empty() => iface,
            _ => &self.path,
        }
    }

    /// `group/interface:version`, omitting the parts that are not set.
    pub fn service_key(&self) -> String {
        let mut key = String::new();
        if let Some(group) = self.param("group").filter(|g| !g.is_empty()) {
            key.push_str(group);
            key.push('/');
        }
        key.push_str(self.interface());
        if let Some(version) = self.param("version").filter(|v| !v.is_empty()) {
            key.push(':');
            key.push_str(version);
        }
        key
    }

    pub fn application(&self) -> &str {
        self.param_or("application", "")
    }

    /// Methods declared by the `methods` param, in declaration order.
    pub fn method_list(&self) -> Vec<&str> {
        self.param("methods")
            .map(|m| {
                m.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FromStr for ServiceUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            return Ok(());
        }
        write!(f, "{}://{}", self.protocol, self.host)?;
        if !self.port.is_empty() {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "/{}", self.path)?;
        if !self.params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}
