//! Webhook subscriber registry.

use std::collections::HashSet;

use paywire_common::{LedgerError, Result};
use url::Url;

/// Maximum number of registered hooks.
pub const MAX_HOOKS: usize = 4;

/// Maximum length of a hook URL in bytes.
pub const MAX_HOOK_URL_LENGTH: usize = 256;

/// Registry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookLimits {
    /// Maximum number of hooks.
    pub max_hooks: usize,
    /// Maximum URL length in bytes.
    pub max_url_length: usize,
}

impl Default for HookLimits {
    fn default() -> Self {
        Self {
            max_hooks: MAX_HOOKS,
            max_url_length: MAX_HOOK_URL_LENGTH,
        }
    }
}

/// Check that `url` is an absolute http(s) URL with a host, within bounds.
pub fn validate_hook_url(url: &str, limits: &HookLimits) -> Result<()> {
    if url.len() > limits.max_url_length {
        return Err(LedgerError::invalid("url", "url too long"));
    }

    // The parser repairs `http:///x` into host `x`; require the raw
    // authority to be present.
    let has_authority = url
        .split_once("://")
        .map_or(false, |(_, rest)| !rest.is_empty() && !rest.starts_with(['/', '\\']));
    if !has_authority {
        return Err(LedgerError::invalid("url", "url has no host"));
    }

    let parsed = Url::parse(url).map_err(|_| LedgerError::invalid("url", "invalid url"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LedgerError::invalid("url", "invalid url scheme"));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(LedgerError::invalid("url", "url has no host")),
    }
}

/// Set of subscriber URLs, keyed by exact string.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    urls: HashSet<String>,
    limits: HookLimits,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new(limits: HookLimits) -> Self {
        Self {
            urls: HashSet::new(),
            limits,
        }
    }

    /// Register a URL.
    pub fn insert(&mut self, url: &str) -> Result<()> {
        validate_hook_url(url, &self.limits)?;

        if self.urls.contains(url) {
            return Err(LedgerError::HookExists(url.to_string()));
        }

        if self.urls.len() >= self.limits.max_hooks {
            return Err(LedgerError::HookLimitReached {
                max: self.limits.max_hooks,
            });
        }

        self.urls.insert(url.to_string());
        Ok(())
    }

    /// Remove a URL. Returns false if it was not registered.
    pub fn remove(&mut self, url: &str) -> bool {
        self.urls.remove(url)
    }

    /// Snapshot of the registered URLs, in no particular order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.iter().cloned().collect()
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Check if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
