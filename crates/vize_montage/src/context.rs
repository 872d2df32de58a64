//! Per-component context shared between a component's virtual modules.
//!
//! The `file` load of a component parses it once and stores the result here,
//! keyed by physical path. Script, template and style loads read it back.
//! Entries are read-only after insertion and are evicted when the path is
//! invalidated. A compile that was running when its path was invalidated
//! does not publish its context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::descriptor::{ScriptFragment, SourceDocument};
use crate::error::{MontageError, MontageResult};
use crate::scope_id::ScopeId;

/// Everything derived loads need to know about their component.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    pub document: Arc<SourceDocument>,
    pub scope_id: ScopeId,
    /// Compiled script, if the component has one
    pub script: Option<Arc<ScriptFragment>>,
}

impl ComponentContext {
    /// Scope attribute, `data-v-<id>`.
    pub fn data_id(&self) -> String {
        self.scope_id.data_attr()
    }
}

/// Context slot of one path. `generation` counts evictions so a compile that
/// started before an eviction cannot publish into the invalidated slot.
#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    context: Option<Arc<ComponentContext>>,
}

/// Process-wide map of component contexts.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    slots: DashMap<PathBuf, Slot>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation of `path`; pass it back to [`Self::insert`].
    pub fn generation(&self, path: &Path) -> u64 {
        self.slots.get(path).map_or(0, |slot| slot.generation)
    }

    /// Store the context for `path`, replacing any previous one.
    ///
    /// Returns `None` without storing when `path` was evicted after
    /// `generation` was read.
    pub fn insert(
        &self,
        path: impl Into<PathBuf>,
        generation: u64,
        context: ComponentContext,
    ) -> Option<Arc<ComponentContext>> {
        let mut slot = self.slots.entry(path.into()).or_default();
        if slot.generation != generation {
            return None;
        }
        let context = Arc::new(context);
        slot.context = Some(Arc::clone(&context));
        Some(context)
    }

    /// Context for `path`; fails if its `file` load has not happened.
    pub fn get(&self, path: &Path) -> MontageResult<Arc<ComponentContext>> {
        self.slots
            .get(path)
            .and_then(|slot| slot.context.clone())
            .ok_or_else(|| MontageError::MissingContext {
                path: path.to_path_buf(),
            })
    }

    /// Drop the context for `path` and fence off compiles already running.
    pub fn evict(&self, path: &Path) -> bool {
        let mut slot = self.slots.entry(path.to_path_buf()).or_default();
        slot.generation += 1;
        slot.context.take().is_some()
    }

    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.context.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
