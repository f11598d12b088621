use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-row write locks, held around read-modify-write cycles the way a
/// `SELECT ... FOR UPDATE` transaction would be. Entries only live while
/// someone holds or waits for the row.
#[derive(Debug, Default)]
pub struct RowLocks {
    rows: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one row until dropped.
#[derive(Debug)]
pub struct RowGuard<'a> {
    locks: &'a RowLocks,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: Uuid) -> RowGuard<'_> {
        let row = self.rows().entry(id).or_default().clone();

        RowGuard {
            locks: self,
            id,
            guard: Some(row.lock_owned().await),
        }
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<AsyncMutex<()>>>> {
        match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for RowGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        // waiters hold a clone of the entry, so a count of one means idle
        let mut rows = self.locks.rows();
        if rows
            .get(&self.id)
            .map_or(false, |row| Arc::strong_count(row) == 1)
        {
            rows.remove(&self.id);
        }
    }
}
