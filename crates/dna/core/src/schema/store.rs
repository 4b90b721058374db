//! Schema registry with lazy parsing and version resolution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{DnaError, DnaResult};
use crate::schema::Schema;

/// Holds the raw JSON sources of all known schema documents and resolves
/// version requests against them.
///
/// Documents are parsed lazily on first resolution and cached for the life
/// of the store; the caches are append-only. Both caches sit behind a mutex
/// so that concurrent first-time resolution of the same version from a
/// thread pool is serialized.
#[derive(Debug)]
pub struct SchemaStore {
    sources: HashMap<String, String>,
    latest_version: String,
    cache: Mutex<HashMap<String, Arc<Schema>>>,
    major_cache: Mutex<HashMap<String, String>>,
}

impl SchemaStore {
    /// Creates an empty store whose no-version requests resolve to
    /// `latest_version`.
    pub fn new(latest_version: impl Into<String>) -> Self {
        Self {
            sources: HashMap::new(),
            latest_version: latest_version.into(),
            cache: Mutex::new(HashMap::new()),
            major_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a raw schema document under its exact version key.
    /// The document is not parsed until first resolved.
    pub fn register(&mut self, version: impl Into<String>, json: impl Into<String>) {
        self.sources.insert(version.into(), json.into());
    }

    /// The declared latest full version.
    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }

    /// All registered full versions, in arbitrary order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Maps a version request to the exact full version it denotes:
    /// `None` -> the declared latest; an exact version (contains `.`) ->
    /// itself; a bare major -> the latest registered subversion of that
    /// major, memoized. Major `"1"` resolves against major `"0"` (the
    /// generation-1 renumbering reused generation-0 documents).
    pub fn complete_version(&self, version: Option<&str>) -> DnaResult<String> {
        let Some(version) = version else {
            return Ok(self.latest_version.clone());
        };
        if version.contains('.') {
            return Ok(version.to_string());
        }
        let mut majors = lock(&self.major_cache);
        if let Some(full) = majors.get(version) {
            return Ok(full.clone());
        }
        let full = latest_subversion(self.versions(), version)?;
        majors.insert(version.to_string(), full.clone());
        Ok(full)
    }

    /// Resolves a version request to a parsed schema document.
    ///
    /// Fails with [`DnaError::SchemaNotFound`] when no document exists for
    /// the resolved version and [`DnaError::VersionMismatch`] when the
    /// document's own `version` field disagrees with its key.
    pub fn resolve(&self, version: Option<&str>) -> DnaResult<Arc<Schema>> {
        let key = self.complete_version(version)?;
        let mut cache = lock(&self.cache);
        if let Some(schema) = cache.get(&key) {
            return Ok(Arc::clone(schema));
        }
        let source = self
            .sources
            .get(&key)
            .ok_or_else(|| DnaError::SchemaNotFound {
                version: key.clone(),
            })?;
        let schema = Arc::new(Schema::from_json(&key, source)?);
        debug!(version = %key, generation = schema.generation(), "loaded schema document");
        cache.insert(key, Arc::clone(&schema));
        Ok(schema)
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    // The guarded maps cannot be left inconsistent, so a poisoned lock is
    // still safe to reuse.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns the greatest registered full version sharing `major`, comparing
/// versions component-wise as numbers.
///
/// Major `"1"` is remapped to `"0"` before matching.
pub fn latest_subversion<'a, I>(versions: I, major: &str) -> DnaResult<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let requested: u32 = major.parse().map_err(|_| DnaError::SchemaNotFound {
        version: major.to_string(),
    })?;
    let requested = if requested == 1 { 0 } else { requested };

    let mut best: Option<(Vec<u32>, &str)> = None;
    for candidate in versions {
        let components: Vec<u32> = candidate
            .split('.')
            .map(|c| c.parse().unwrap_or(0))
            .collect();
        if components.first().copied() != Some(requested) {
            continue;
        }
        match &best {
            Some((current, _)) if *current >= components => {}
            _ => best = Some((components, candidate)),
        }
    }

    best.map(|(_, v)| v.to_string())
        .ok_or_else(|| DnaError::SchemaNotFound {
            version: major.to_string(),
        })
}
