//! Registry of column types
//!
//! The [`TypeRegistry`] maps a value's [`ValueKind`] to every registered
//! [`ColumnType`] that natively handles it, ordered by priority. Lookups are
//! memoized per kind; repeated lookups of the same kind return the same
//! shared slice.

use super::column_type::{builtins, codec_id, ColumnType};
use super::error::{DatabaseError, Result};
use super::value::{DatabaseValue, ValueKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Column types matching one value kind, highest priority first
pub type TypeList = Arc<[Arc<dyn ColumnType>]>;

/// Thread-safe registry of column types
///
/// Registration is deduplicated by the concrete codec type: registering a
/// second `SmallInt` with a different width is a no-op. Once a kind has been
/// looked up, its result is cached for the life of the registry, so types
/// registered afterwards are not visible for that kind.
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<Vec<Arc<dyn ColumnType>>>,
    cache: RwLock<HashMap<ValueKind, TypeList>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in column type
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for column_type in builtins() {
            registry.register(column_type);
        }
        registry
    }

    /// Register a column type
    ///
    /// Returns `false` when a type of the same concrete codec is already registered.
    pub fn register(&self, column_type: Arc<dyn ColumnType>) -> bool {
        let id = codec_id(column_type.as_ref());
        let mut types = self.types.write();
        if types.iter().any(|t| codec_id(t.as_ref()) == id) {
            debug!(column_type = column_type.name(), "column type already registered");
            return false;
        }

        let kind = column_type.native_kind();
        if self.cache.read().contains_key(&kind) {
            warn!(
                column_type = column_type.name(),
                kind = %kind,
                "registered after lookup; cached results for this kind will not include it"
            );
        }
        debug!(
            column_type = column_type.name(),
            kind = %kind,
            priority = column_type.priority(),
            "registered column type"
        );
        types.push(column_type);
        true
    }

    /// Every registered type whose native kind is `kind`, lowest priority value first
    ///
    /// Ties keep registration order. An unknown kind yields an empty list.
    pub fn lookup(&self, kind: ValueKind) -> TypeList {
        if let Some(hit) = self.cache.read().get(&kind) {
            return Arc::clone(hit);
        }

        let mut matching: Vec<Arc<dyn ColumnType>> = self
            .types
            .read()
            .iter()
            .filter(|t| t.native_kind() == kind)
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.priority());

        // First writer wins so every caller shares one list per kind
        let mut cache = self.cache.write();
        Arc::clone(cache.entry(kind).or_insert_with(|| matching.into()))
    }

    /// The highest-priority type for `value`'s kind
    ///
    /// # Errors
    ///
    /// Returns `NoTypeMapping` when nothing is registered for the kind
    pub fn first(&self, value: &DatabaseValue) -> Result<Arc<dyn ColumnType>> {
        let kind = value.kind();
        self.lookup(kind)
            .first()
            .cloned()
            .ok_or_else(|| DatabaseError::no_type_mapping(kind))
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Check if no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Check if a type of the same concrete codec as `column_type` is registered
    pub fn contains(&self, column_type: &dyn ColumnType) -> bool {
        let id = codec_id(column_type);
        self.types.read().iter().any(|t| codec_id(t.as_ref()) == id)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.types.read().iter().map(|t| t.name()).collect();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}
