//! The graph store surface the harness drives.
//!
//! The store itself is an external collaborator; the harness only needs the
//! operations below. [`memory::MemoryStore`] is the bundled reference
//! implementation used by the binary and the test suite.

use thiserror::Error;

mod memory;

pub use memory::MemoryStore;

/// Opaque handle to a live entity (node). Store-assigned; never interpreted.
pub type EntityId = u64;

/// Opaque handle to a relationship between two entities.
pub type RelationshipId = u64;

/// Relationship kind written by bulk creation tasks.
pub const REL_KIND_BULK: &str = "BULK";

/// Relationship kind written by single-create tasks.
pub const REL_KIND_GENERIC: &str = "GENERIC";

/// Property values the mutation workers write.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Boolean.
    Bool(bool),
    /// String of at most 50 symbols.
    Text(String),
    /// Fixed 3-element string list.
    TextList(Vec<String>),
}

/// Failures produced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The entity does not exist (or no longer exists).
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    /// The relationship does not exist (or no longer exists).
    #[error("relationship {0} not found")]
    RelationshipNotFound(RelationshipId),
    /// Entity deletion was attempted while relationships remain attached.
    #[error("entity {0} still has {1} attached relationships")]
    EntityStillWired(EntityId, usize),
    /// An operation was issued on a committed or rolled-back transaction.
    #[error("transaction is no longer active")]
    TransactionClosed,
}

/// A graph store the harness can soak.
///
/// Cloning must be cheap (a handle onto shared state): every submitted task
/// carries its own clone into a pool thread. The non-transactional read
/// surface exists for full scans; it observes committed state only and must
/// not be called while the caller holds an open transaction.
pub trait GraphStore: Clone + Send + Sync + 'static {
    /// Transaction type produced by [`GraphStore::begin`].
    type Tx: StoreTransaction;

    /// Opens a transaction. All mutations happen inside one.
    fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Snapshot of every live entity handle (full scan).
    fn all_entities(&self) -> Result<Vec<EntityId>, StoreError>;

    /// Relationships attached to `entity`, in either direction.
    fn relationships(&self, entity: EntityId) -> Result<Vec<RelationshipId>, StoreError>;

    /// Property keys present on `entity`.
    fn entity_property_keys(&self, entity: EntityId) -> Result<Vec<String>, StoreError>;

    /// Value of `key` on `entity`, or `None` if the key is absent.
    fn entity_property(
        &self,
        entity: EntityId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError>;

    /// Property keys present on `rel`.
    fn relationship_property_keys(&self, rel: RelationshipId) -> Result<Vec<String>, StoreError>;

    /// Value of `key` on `rel`, or `None` if the key is absent.
    fn relationship_property(
        &self,
        rel: RelationshipId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError>;
}

/// One open transaction.
///
/// # Lifecycle
///
/// A transaction is active from [`GraphStore::begin`] until [`commit`] or
/// [`rollback`] consumes it. Dropping an active transaction rolls it back.
/// Any operation after close fails with [`StoreError::TransactionClosed`].
///
/// [`commit`]: StoreTransaction::commit
/// [`rollback`]: StoreTransaction::rollback
pub trait StoreTransaction {
    /// Creates a new entity and returns its handle.
    fn create_entity(&mut self) -> Result<EntityId, StoreError>;

    /// Deletes `entity`. Fails with [`StoreError::EntityStillWired`] while
    /// any relationship remains attached.
    fn delete_entity(&mut self, entity: EntityId) -> Result<(), StoreError>;

    /// Creates a directed relationship of the given kind.
    fn create_relationship(
        &mut self,
        from: EntityId,
        to: EntityId,
        kind: &str,
    ) -> Result<RelationshipId, StoreError>;

    /// Deletes a relationship.
    fn delete_relationship(&mut self, rel: RelationshipId) -> Result<(), StoreError>;

    /// Relationships attached to `entity`, in either direction.
    fn relationships(&self, entity: EntityId) -> Result<Vec<RelationshipId>, StoreError>;

    /// Property keys present on `entity`.
    fn entity_property_keys(&self, entity: EntityId) -> Result<Vec<String>, StoreError>;

    /// Value of `key` on `entity`, or `None` if the key is absent.
    fn entity_property(
        &self,
        entity: EntityId,
        key: &str,
    ) -> Result<Option<PropertyValue>, StoreError>;

    /// Sets `key` on `entity`, replacing any previous value.
    fn set_entity_property(
        &mut self,
        entity: EntityId,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError>;

    /// Sets `key` on `rel`, replacing any previous value.
    fn set_relationship_property(
        &mut self,
        rel: RelationshipId,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError>;

    /// Makes the transaction's effects durable and closes it.
    fn commit(self) -> Result<(), StoreError>;

    /// Discards the transaction's effects and closes it.
    fn rollback(self) -> Result<(), StoreError>;
}
