//! Component scope IDs.
//!
//! Every component gets an 8-character lowercase hex token used for scoped
//! styles (`data-v-<id>`). In `hash` mode the token is a digest of the file's
//! project-relative path, so two builds of the same tree agree. In `random`
//! mode it is drawn from a counter-driven byte stream that can be seeded for
//! reproducible tests.
//!
//! IDs are issued once per physical path and reused afterwards, independent of
//! whether load results are cached.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use vize_carton::hash::{digest_bytes, short_digest, to_hex};
use vize_carton::path::to_slash;
use vize_carton::FxHashMap;

use crate::error::{MontageError, MontageResult};

/// Number of hex characters in a scope ID.
pub const SCOPE_ID_LEN: usize = 8;

/// Size of the ID space (`16^8`).
const ID_SPACE: f64 = 4_294_967_296.0;

/// An 8-character lowercase hexadecimal component identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Build from a hex string, keeping the first [`SCOPE_ID_LEN`] characters.
    pub fn from_hex(hex: &str) -> MontageResult<Self> {
        match hex.get(..SCOPE_ID_LEN) {
            Some(prefix)
                if prefix
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) =>
            {
                Ok(Self(prefix.to_string()))
            }
            _ => Err(MontageError::Config(format!(
                "scope id must start with {} lowercase hex characters, got \"{}\"",
                SCOPE_ID_LEN, hex
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scoping attribute name, `data-v-<id>`.
    pub fn data_attr(&self) -> String {
        format!("data-v-{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic byte stream: SHA-256 over `seed || counter`.
pub struct RandomBytes {
    seed: Vec<u8>,
    counter: AtomicU64,
}

impl RandomBytes {
    /// Reproducible stream for a given seed.
    pub fn seeded(seed: &str) -> Self {
        Self {
            seed: seed.as_bytes().to_vec(),
            counter: AtomicU64::new(0),
        }
    }

    /// Stream seeded from OS entropy.
    pub fn from_entropy() -> MontageResult<Self> {
        let mut seed = [0u8; 32];
        getrandom::fill(&mut seed)
            .map_err(|e| MontageError::Config(format!("failed to seed scope ids: {e}")))?;
        Ok(Self {
            seed: seed.to_vec(),
            counter: AtomicU64::new(0),
        })
    }

    /// Next `n` bytes of the stream.
    pub fn next_bytes(&self, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let counter = self.counter.fetch_add(1, Ordering::Relaxed);
            let mut block = self.seed.clone();
            block.extend_from_slice(&counter.to_le_bytes());
            let digest = digest_bytes(&block);
            let take = (n - out.len()).min(digest.len());
            out.extend_from_slice(&digest[..take]);
        }
        out
    }
}

/// How scope IDs are derived.
pub enum ScopeIdStrategy {
    /// Digest of the project-relative path.
    Hash,
    /// Drawn from a byte stream.
    Random(RandomBytes),
}

impl ScopeIdStrategy {
    /// Derive a fresh ID. `relative_path` is only used in hash mode.
    fn derive(&self, relative_path: &Path) -> ScopeId {
        match self {
            Self::Hash => ScopeId(short_digest(&to_slash(relative_path), SCOPE_ID_LEN)),
            Self::Random(bytes) => ScopeId(to_hex(&bytes.next_bytes(SCOPE_ID_LEN / 2))),
        }
    }
}

#[derive(Default)]
struct Issued {
    by_path: FxHashMap<PathBuf, ScopeId>,
    by_id: FxHashMap<ScopeId, PathBuf>,
}

/// Issues one stable scope ID per physical path for the lifetime of a build.
pub struct ScopeIdGenerator {
    strategy: ScopeIdStrategy,
    /// Acceptable probability that two issued IDs collide
    collision_bound: f64,
    bound_warned: AtomicBool,
    issued: Mutex<Issued>,
}

impl ScopeIdGenerator {
    pub fn new(strategy: ScopeIdStrategy, collision_bound: f64) -> Self {
        Self {
            strategy,
            collision_bound,
            bound_warned: AtomicBool::new(false),
            issued: Mutex::new(Issued::default()),
        }
    }

    /// Return the ID for `path`, deriving it on first request.
    ///
    /// `relative_path` is `path` relative to the build root.
    pub fn id_for(&self, path: &Path, relative_path: &Path) -> ScopeId {
        let mut issued = self.issued.lock();
        if let Some(id) = issued.by_path.get(path) {
            return id.clone();
        }

        let id = self.strategy.derive(relative_path);
        if let Some(other) = issued.by_id.get(&id) {
            tracing::warn!(
                "scope id {} collides: {} and {}",
                id,
                other.display(),
                path.display()
            );
        } else {
            issued.by_id.insert(id.clone(), path.to_path_buf());
        }
        issued.by_path.insert(path.to_path_buf(), id.clone());

        let count = issued.by_path.len();
        if collision_probability(count) > self.collision_bound
            && !self.bound_warned.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                "{} components exceed the configured scope id collision bound ({:e})",
                count,
                self.collision_bound
            );
        }

        id
    }

    /// Number of components that have an ID.
    pub fn issued_count(&self) -> usize {
        self.issued.lock().by_path.len()
    }
}

/// Birthday-bound estimate of any collision among `count` IDs.
pub fn collision_probability(count: usize) -> f64 {
    let n = count as f64;
    (n * (n - 1.0) / 2.0 / ID_SPACE).min(1.0)
}
