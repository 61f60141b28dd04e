use std::cell::RefCell;
use std::sync::RwLock;

use cosmwasm_std::Storage;

use crate::error::ContractError;

/// Storage port for the draw engine.
///
/// `read` gives shared access for advisory reads. `commit` gives exclusive
/// access for the whole closure; every check-and-write on the ledger runs
/// inside one `commit` call.
pub trait DrawStore {
    fn read<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&dyn Storage) -> Result<T, ContractError>;

    fn commit<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&mut dyn Storage) -> Result<T, ContractError>;
}

/// Storage of a single contract transaction.
///
/// The chain executes transactions one at a time and rolls back the ones
/// that fail, so no further locking is needed here.
pub struct TxStorage<'a> {
    storage: RefCell<&'a mut dyn Storage>,
}

impl<'a> TxStorage<'a> {
    pub fn new(storage: &'a mut dyn Storage) -> Self {
        Self {
            storage: RefCell::new(storage),
        }
    }
}

impl DrawStore for TxStorage<'_> {
    fn read<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&dyn Storage) -> Result<T, ContractError>,
    {
        let storage = self.storage.borrow();
        f(&**storage)
    }

    fn commit<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&mut dyn Storage) -> Result<T, ContractError>,
    {
        let mut storage = self.storage.borrow_mut();
        f(&mut **storage)
    }
}

/// Storage shared between threads behind a ledger-wide lock.
///
/// Reads take the read lock; `commit` holds the write lock for the whole
/// check-and-insert, which serializes it against every other commit and
/// against ledger resets.
pub struct SharedStore<S> {
    inner: RwLock<S>,
}

impl<S: Storage> SharedStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            inner: RwLock::new(storage),
        }
    }

    pub fn into_inner(self) -> Result<S, ContractError> {
        self.inner.into_inner().map_err(|_| lock_poisoned())
    }
}

impl<S: Storage> DrawStore for SharedStore<S> {
    fn read<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&dyn Storage) -> Result<T, ContractError>,
    {
        let storage = self.inner.read().map_err(|_| lock_poisoned())?;
        f(&*storage)
    }

    fn commit<T, F>(&self, f: F) -> Result<T, ContractError>
    where
        F: FnOnce(&mut dyn Storage) -> Result<T, ContractError>,
    {
        let mut storage = self.inner.write().map_err(|_| lock_poisoned())?;
        f(&mut *storage)
    }
}

fn lock_poisoned() -> ContractError {
    ContractError::StorageUnavailable {
        reason: "ledger lock poisoned by a panicked writer".to_string(),
    }
}
