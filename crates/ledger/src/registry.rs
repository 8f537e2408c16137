//! School registry: classes and roster membership.
//!
//! The registry is the validation source for placement batches (does the
//! class exist, does the pupil belong to it) and the class list behind
//! per-shift statistics. Registration happens out-of-band (imports,
//! administration); the engine only reads.

use std::sync::Arc;

use rollbook_storage::{ClassId, PupilId, StorageBackend, codec};

use crate::{
    error::LedgerResult,
    keys,
    records::{PupilRecord, SchoolClass},
};

/// Typed repository for classes and pupils.
///
/// Cheaply cloneable; all clones share the injected backend.
#[derive(Clone)]
pub struct SchoolRegistry {
    backend: Arc<dyn StorageBackend>,
}

impl SchoolRegistry {
    /// Creates a registry over the given backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Registers a class, replacing any previous definition.
    pub async fn register_class(&self, class: &SchoolClass) -> LedgerResult<()> {
        self.backend.set(keys::class_key(class.id), codec::encode(class)?).await?;
        Ok(())
    }

    /// Registers a pupil as a member of `class`, replacing any previous
    /// enrollment.
    pub async fn register_pupil(&self, pupil: PupilId, class: ClassId) -> LedgerResult<()> {
        let record = PupilRecord { id: pupil, class };
        self.backend.set(keys::pupil_key(pupil), codec::encode(&record)?).await?;
        Ok(())
    }

    /// Looks up a class definition.
    pub async fn class(&self, class: ClassId) -> LedgerResult<Option<SchoolClass>> {
        match self.backend.get(&keys::class_key(class)).await? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Looks up the class a pupil is enrolled in.
    pub async fn pupil_class(&self, pupil: PupilId) -> LedgerResult<Option<ClassId>> {
        match self.backend.get(&keys::pupil_key(pupil)).await? {
            Some(bytes) => {
                let record: PupilRecord = codec::decode(&bytes)?;
                Ok(Some(record.class))
            },
            None => Ok(None),
        }
    }

    /// Lists all registered classes, ordered by ID.
    pub async fn classes(&self) -> LedgerResult<Vec<SchoolClass>> {
        let mut out = Vec::new();
        for kv in self.backend.get_prefix(&keys::class_prefix()).await? {
            out.push(codec::decode(&kv.value)?);
        }
        Ok(out)
    }
}
