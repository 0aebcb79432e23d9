//! Bundled in-memory store.
//!
//! A coarse mutex serializes transactions: `begin` takes the lock for the
//! transaction's whole lifetime, while the non-transactional read surface
//! locks per call. Mutations are journaled so rollback (explicit or via
//! drop) restores the pre-transaction state exactly.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use super::{
    EntityId, GraphStore, PropertyValue, RelationshipId, StoreError, StoreTransaction,
};

#[derive(Debug, Clone, Default)]
struct EntityRecord {
    properties: BTreeMap<String, PropertyValue>,
    rels: Vec<RelationshipId>,
}

#[derive(Debug, Clone)]
struct RelationshipRecord {
    from: EntityId,
    to: EntityId,
    #[allow(dead_code)]
    kind: String,
    properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Default)]
struct StoreInner {
    next_entity: EntityId,
    next_relationship: RelationshipId,
    entities: BTreeMap<EntityId, EntityRecord>,
    relationships: BTreeMap<RelationshipId, RelationshipRecord>,
}

impl StoreInner {
    fn attach(&mut self, rel: RelationshipId, from: EntityId, to: EntityId) {
        if let Some(record) = self.entities.get_mut(&from) {
            record.rels.push(rel);
        }
        if let Some(record) = self.entities.get_mut(&to) {
            record.rels.push(rel);
        }
    }

    fn detach(&mut self, rel: RelationshipId) -> Option<RelationshipRecord> {
        let record = self.relationships.remove(&rel)?;
        if let Some(entity) = self.entities.get_mut(&record.from) {
            entity.rels.retain(|r| *r != rel);
        }
        if let Some(entity) = self.entities.get_mut(&record.to) {
            entity.rels.retain(|r| *r != rel);
        }
        Some(record)
    }
}

enum UndoOp {
    CreateEntity(EntityId),
    DeleteEntity(EntityId, EntityRecord),
    CreateRelationship(RelationshipId),
    DeleteRelationship(RelationshipId, RelationshipRecord),
    SetEntityProperty(EntityId, String, Option<PropertyValue>),
    SetRelationshipProperty(RelationshipId, String, Option<PropertyValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Active,
    Committed,
    RolledBack,
}

/// In-memory graph store; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.inner.lock().entities.len()
    }

    /// Number of live relationships.
    pub fn relationship_count(&self) -> usize {
        self.inner.lock().relationships.len()
    }
}

impl GraphStore for MemoryStore {
    type Tx = MemoryTx;

    fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            inner: self.inner.lock_arc(),
            journal: Vec::new(),
            state: TxState::Active,
        })
    }

    fn all_entities(&self) -> Result<Vec<EntityId>, StoreError> {
        Ok(self.inner.lock().entities.keys().copied().collect())
    }

    fn relationships(&self, entity: EntityId) -> Result<Vec<RelationshipId>, StoreError> {
        self.inner
            .lock()
            .entities
            .get(&entity)
            .map(|record| record.rels.clone())
            .ok_or(StoreError::EntityNotFound(entity))
    }

    fn entity_property_keys(&self, entity: EntityId) -> Result<Vec<String>, StoreError> {
        self.inner
            .lock()
            .entities
            .get(&entity)
            .map(|record| record.properties.keys().cloned().collect())
            .ok_or(StoreError::EntityNotFound(entity))
    }

    fn entity_property(
        &self,
        entity: EntityId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError> {
        let inner = self.inner.lock();
        let record = inner
            .entities
            .get(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        Ok(record.properties.get(key).cloned())
    }

    fn relationship_property_keys(&self, rel: RelationshipId) -> Result<Vec<String>, StoreError> {
        self.inner
            .lock()
            .relationships
            .get(&rel)
            .map(|record| record.properties.keys().cloned().collect())
            .ok_or(StoreError::RelationshipNotFound(rel))
    }

    fn relationship_property(
        &self,
        rel: RelationshipId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError> {
        let inner = self.inner.lock();
        let record = inner
            .relationships
            .get(&rel)
            .ok_or(StoreError::RelationshipNotFound(rel))?;
        Ok(record.properties.get(key).cloned())
    }
}

/// A [`MemoryStore`] transaction. Holds the store lock until closed.
pub struct MemoryTx {
    inner: ArcMutexGuard<RawMutex, StoreInner>,
    journal: Vec<UndoOp>,
    state: TxState,
}

impl MemoryTx {
    fn ensure_active(&self) -> Result<(), StoreError> {
        if self.state == TxState::Active {
            Ok(())
        } else {
            Err(StoreError::TransactionClosed)
        }
    }

    fn revert(inner: &mut StoreInner, journal: &mut Vec<UndoOp>) {
        while let Some(op) = journal.pop() {
            match op {
                UndoOp::CreateEntity(id) => {
                    inner.entities.remove(&id);
                }
                UndoOp::DeleteEntity(id, record) => {
                    inner.entities.insert(id, record);
                }
                UndoOp::CreateRelationship(id) => {
                    inner.detach(id);
                }
                UndoOp::DeleteRelationship(id, record) => {
                    let (from, to) = (record.from, record.to);
                    inner.relationships.insert(id, record);
                    inner.attach(id, from, to);
                }
                UndoOp::SetEntityProperty(id, key, previous) => {
                    if let Some(entity) = inner.entities.get_mut(&id) {
                        match previous {
                            Some(value) => {
                                entity.properties.insert(key, value);
                            }
                            None => {
                                entity.properties.remove(&key);
                            }
                        }
                    }
                }
                UndoOp::SetRelationshipProperty(id, key, previous) => {
                    if let Some(rel) = inner.relationships.get_mut(&id) {
                        match previous {
                            Some(value) => {
                                rel.properties.insert(key, value);
                            }
                            None => {
                                rel.properties.remove(&key);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl StoreTransaction for MemoryTx {
    fn create_entity(&mut self) -> Result<EntityId, StoreError> {
        self.ensure_active()?;
        let inner = &mut *self.inner;
        let id = inner.next_entity;
        inner.next_entity += 1;
        inner.entities.insert(id, EntityRecord::default());
        self.journal.push(UndoOp::CreateEntity(id));
        Ok(id)
    }

    fn delete_entity(&mut self, entity: EntityId) -> Result<(), StoreError> {
        self.ensure_active()?;
        let inner = &mut *self.inner;
        let record = inner
            .entities
            .remove(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        if !record.rels.is_empty() {
            let attached = record.rels.len();
            inner.entities.insert(entity, record);
            return Err(StoreError::EntityStillWired(entity, attached));
        }
        self.journal.push(UndoOp::DeleteEntity(entity, record));
        Ok(())
    }

    fn create_relationship(
        &mut self,
        from: EntityId,
        to: EntityId,
        kind: &str,
    ) -> Result<RelationshipId, StoreError> {
        self.ensure_active()?;
        let inner = &mut *self.inner;
        if !inner.entities.contains_key(&from) {
            return Err(StoreError::EntityNotFound(from));
        }
        if !inner.entities.contains_key(&to) {
            return Err(StoreError::EntityNotFound(to));
        }
        let id = inner.next_relationship;
        inner.next_relationship += 1;
        inner.relationships.insert(
            id,
            RelationshipRecord {
                from,
                to,
                kind: kind.to_owned(),
                properties: BTreeMap::new(),
            },
        );
        inner.attach(id, from, to);
        self.journal.push(UndoOp::CreateRelationship(id));
        Ok(id)
    }

    fn delete_relationship(&mut self, rel: RelationshipId) -> Result<(), StoreError> {
        self.ensure_active()?;
        let record = self
            .inner
            .detach(rel)
            .ok_or(StoreError::RelationshipNotFound(rel))?;
        self.journal.push(UndoOp::DeleteRelationship(rel, record));
        Ok(())
    }

    fn relationships(&self, entity: EntityId) -> Result<Vec<RelationshipId>, StoreError> {
        self.ensure_active()?;
        self.inner
            .entities
            .get(&entity)
            .map(|record| record.rels.clone())
            .ok_or(StoreError::EntityNotFound(entity))
    }

    fn entity_property_keys(&self, entity: EntityId) -> Result<Vec<String>, StoreError> {
        self.ensure_active()?;
        self.inner
            .entities
            .get(&entity)
            .map(|record| record.properties.keys().cloned().collect())
            .ok_or(StoreError::EntityNotFound(entity))
    }

    fn entity_property(
        &self,
        entity: EntityId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError> {
        self.ensure_active()?;
        let record = self
            .inner
            .entities
            .get(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        Ok(record.properties.get(key).cloned())
    }

    fn set_entity_property(
        &mut self,
        entity: EntityId,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        self.ensure_active()?;
        let record = self
            .inner
            .entities
            .get_mut(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        let previous = record.properties.insert(key.to_owned(), value);
        self.journal
            .push(UndoOp::SetEntityProperty(entity, key.to_owned(), previous));
        Ok(())
    }

    fn set_relationship_property(
        &mut self,
        rel: RelationshipId,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        self.ensure_active()?;
        let record = self
            .inner
            .relationships
            .get_mut(&rel)
            .ok_or(StoreError::RelationshipNotFound(rel))?;
        let previous = record.properties.insert(key.to_owned(), value);
        self.journal
            .push(UndoOp::SetRelationshipProperty(rel, key.to_owned(), previous));
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        self.ensure_active()?;
        self.journal.clear();
        self.state = TxState::Committed;
        Ok(())
    }

    fn rollback(mut self) -> Result<(), StoreError> {
        self.ensure_active()?;
        Self::revert(&mut self.inner, &mut self.journal);
        self.state = TxState::RolledBack;
        Ok(())
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        // Abandoned while active: discard effects, same as rollback.
        if self.state == TxState::Active {
            Self::revert(&mut self.inner, &mut self.journal);
            self.state = TxState::RolledBack;
        }
    }
}
