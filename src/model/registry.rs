//! Shared cache of persistent entities keyed by qualified name.

use std::sync::Arc;

use dashmap::DashMap;

use super::entity::PersistentEntity;
use super::property::Relation;
use crate::error::{BuildError, BuildResult};

/// Registry of entities, safe to share across threads.
///
/// Entities are inserted once and never replaced; lookups hand out `Arc`s so
/// builders on different threads read the same immutable definitions.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: DashMap<String, Arc<PersistentEntity>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of entities.
    pub fn with_entities(entities: impl IntoIterator<Item = PersistentEntity>) -> Self {
        let registry = Self::new();
        for entity in entities {
            registry.register(entity);
        }
        registry
    }

    /// Register an entity. If one with the same name exists, the existing
    /// definition is kept and returned.
    pub fn register(&self, entity: PersistentEntity) -> Arc<PersistentEntity> {
        self.entities
            .entry(entity.name.clone())
            .or_insert_with(|| Arc::new(entity))
            .clone()
    }

    /// Return the cached entity, constructing it on first use.
    pub fn get_or_register_with<F>(&self, name: &str, build: F) -> Arc<PersistentEntity>
    where
        F: FnOnce() -> PersistentEntity,
    {
        self.entities
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(build()))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<PersistentEntity>> {
        self.entities.get(name).map(|e| e.value().clone())
    }

    /// Look up an entity, failing with `UnknownEntity`.
    pub fn require(&self, name: &str) -> BuildResult<Arc<PersistentEntity>> {
        self.get(name)
            .ok_or_else(|| BuildError::UnknownEntity(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Check cross-entity references.
    ///
    /// Every association must target a registered entity, `mapped_by` must name
    /// an association on the target, and non-embedded targets must declare an
    /// identity.
    pub fn validate(&self) -> BuildResult<()> {
        for name in self.names() {
            let entity = self.require(&name)?;
            for prop in entity.all_properties() {
                let Some(assoc) = &prop.association else {
                    continue;
                };
                let target = self.get(&assoc.entity).ok_or_else(|| {
                    BuildError::InvalidModel(format!(
                        "association '{}.{}' targets unknown entity '{}'",
                        entity.name, prop.name, assoc.entity
                    ))
                })?;
                if assoc.kind != Relation::Embedded && target.identity.is_none() {
                    return Err(BuildError::InvalidModel(format!(
                        "association '{}.{}' targets '{}', which has no identity",
                        entity.name, prop.name, target.name
                    )));
                }
                if let Some(mapped_by) = &assoc.mapped_by {
                    let inverse_ok = target
                        .property_named(mapped_by)
                        .is_some_and(|p| p.is_association());
                    if !inverse_ok {
                        return Err(BuildError::InvalidModel(format!(
                            "association '{}.{}' is mapped by '{}.{}', which is not an association",
                            entity.name, prop.name, target.name, mapped_by
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
