//! Rollup registry: namespace <-> rollup name mapping mined from the explorer bundle.
//!
//! The registry is an owned service. Readers take an `Arc` of the current
//! snapshot; a refresh builds a complete new snapshot and swaps it in, so a
//! partially built mapping is never visible. A refresh that starts while
//! another is in flight is a no-op.

pub mod extract;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::constants::registry::NAME_ALIASES;
use crate::constants::upstream::USER_AGENT;
use crate::error::{Result, ScanError};
use crate::types::RollupEntry;

pub use extract::extract_rollups;

/// One immutable view of the registry.
#[derive(Debug, Default, Clone)]
pub struct RegistrySnapshot {
    entries: Vec<RollupEntry>,
    by_name: HashMap<String, u64>,
}

fn name_key(name: &str) -> String {
    name.trim().to_uppercase()
}

impl RegistrySnapshot {
    pub fn build(entries: Vec<RollupEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len() + NAME_ALIASES.len());
        for entry in &entries {
            let key = name_key(&entry.name);
            for (name, alias) in NAME_ALIASES {
                if key == *name {
                    by_name.insert(alias.to_string(), entry.namespace);
                }
            }
            by_name.insert(key, entry.namespace);
        }
        Self { entries, by_name }
    }

    pub fn entries(&self) -> &[RollupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive, trimmed exact match on display name or curated alias.
    pub fn resolve_by_name(&self, name: &str) -> Option<u64> {
        self.by_name.get(&name_key(name)).copied()
    }

    pub fn entry_by_namespace(&self, namespace: u64) -> Option<&RollupEntry> {
        self.entries.iter().find(|r| r.namespace == namespace)
    }

    pub fn resolve_by_namespace(&self, namespace: u64) -> Option<&str> {
        self.entry_by_namespace(namespace).map(|r| r.name.as_str())
    }

    /// Like [`Self::resolve_by_namespace`], but an unregistered namespace is `NotFound`.
    pub fn require_namespace(&self, namespace: u64) -> Result<&str> {
        self.resolve_by_namespace(namespace).ok_or_else(|| {
            ScanError::NotFound(format!("No rollup found for namespace {namespace}"))
        })
    }

    /// Digits match the namespace, anything else matches the name
    /// case-insensitively. Every match is returned.
    pub fn search_by_term(&self, term: &str) -> Vec<RollupEntry> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }

        if term.bytes().all(|b| b.is_ascii_digit()) {
            let Ok(target) = term.parse::<u64>() else {
                return Vec::new();
            };
            self.entries
                .iter()
                .filter(|r| r.namespace == target)
                .cloned()
                .collect()
        } else {
            let target = term.to_lowercase();
            self.entries
                .iter()
                .filter(|r| r.name.to_lowercase() == target)
                .cloned()
                .collect()
        }
    }
}

/// Result of a [`RollupRegistry::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { entries: usize },
    AlreadyInFlight,
}

/// Clears the in-flight flag even if the refresh future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct RollupRegistry {
    client: reqwest::Client,
    bundle_url: String,
    snapshot: RwLock<Option<Arc<RegistrySnapshot>>>,
    loading: AtomicBool,
}

impl RollupRegistry {
    pub fn new(client: reqwest::Client, bundle_url: impl Into<String>) -> Self {
        Self {
            client,
            bundle_url: bundle_url.into(),
            snapshot: RwLock::new(None),
            loading: AtomicBool::new(false),
        }
    }

    pub fn bundle_url(&self) -> &str {
        &self.bundle_url
    }

    /// Fetch the bundle text as-is.
    pub async fn fetch_bundle(&self) -> Result<String> {
        let res = self
            .client
            .get(&self.bundle_url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/javascript, text/javascript, */*")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| ScanError::UpstreamUnavailable(format!("registry bundle: {e}")))?;

        if !res.status().is_success() {
            return Err(ScanError::UpstreamUnavailable(format!(
                "registry bundle: http {}",
                res.status()
            )));
        }
        res.text()
            .await
            .map_err(|e| ScanError::UpstreamUnavailable(format!("registry bundle: {e}")))
    }

    /// Re-fetch the bundle and replace the snapshot. A call made while
    /// another refresh is running returns `AlreadyInFlight` without fetching.
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("[registry] refresh already in flight");
            return Ok(RefreshOutcome::AlreadyInFlight);
        }
        let _guard = InFlight(&self.loading);

        let bundle = self.fetch_bundle().await?;
        let entries = self.install_from_text(&bundle)?;
        log::info!("[registry] loaded {entries} rollups");
        Ok(RefreshOutcome::Refreshed { entries })
    }

    /// Build a snapshot from bundle text and swap it in.
    pub fn install_from_text(&self, bundle: &str) -> Result<usize> {
        let rollups = extract_rollups(bundle);
        if rollups.is_empty() {
            log::error!("[registry] bundle matched no rollup entries");
            return Err(ScanError::NoRollupDataFound);
        }
        let count = rollups.len();
        self.install(RegistrySnapshot::build(rollups));
        Ok(count)
    }

    fn install(&self, snapshot: RegistrySnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
    }

    /// Current snapshot, if one has been loaded.
    pub fn snapshot(&self) -> Option<Arc<RegistrySnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Load the registry on first use. Fails if the bundle cannot be loaded,
    /// or if another caller's load has not finished yet.
    pub async fn ensure_ready(&self) -> Result<Arc<RegistrySnapshot>> {
        if let Some(s) = self.snapshot() {
            return Ok(s);
        }
        self.refresh().await?;
        self.snapshot().ok_or_else(|| {
            ScanError::UpstreamUnavailable("rollup registry is still loading".to_string())
        })
    }

    pub fn resolve_by_name(&self, name: &str) -> Option<u64> {
        self.snapshot()?.resolve_by_name(name)
    }

    pub fn resolve_by_namespace(&self, namespace: u64) -> Option<String> {
        self.snapshot()?
            .resolve_by_namespace(namespace)
            .map(str::to_string)
    }

    pub fn entry_by_namespace(&self, namespace: u64) -> Option<RollupEntry> {
        self.snapshot()?.entry_by_namespace(namespace).cloned()
    }

    pub fn search_by_term(&self, term: &str) -> Vec<RollupEntry> {
        self.snapshot()
            .map(|s| s.search_by_term(term))
            .unwrap_or_default()
    }

    pub fn all_rollups(&self) -> Vec<RollupEntry> {
        self.snapshot()
            .map(|s| s.entries().to_vec())
            .unwrap_or_default()
    }
}
