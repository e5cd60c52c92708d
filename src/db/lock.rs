// src/db/lock.rs
//
// Process-wide reader/writer lock in front of the pool.
//
// SQLite does not arbitrate writers across independently pooled
// connections, so the application does: readers share, a writer
// excludes everyone. Only the session layer takes this lock.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub type SharedGuard<'a> = RwLockReadGuard<'a, ()>;
pub type ExclusiveGuard<'a> = RwLockWriteGuard<'a, ()>;

pub struct LockCoordinator {
    lock: RwLock<()>,
    /// `None` blocks indefinitely
    timeout: Option<Duration>,
}

impl LockCoordinator {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            lock: RwLock::new(()),
            timeout,
        }
    }

    pub(crate) fn shared(&self) -> AppResult<SharedGuard<'_>> {
        match self.timeout {
            None => Ok(self.lock.read()),
            Some(timeout) => self
                .lock
                .try_read_for(timeout)
                .ok_or(AppError::LockTimeout(timeout)),
        }
    }

    pub(crate) fn exclusive(&self) -> AppResult<ExclusiveGuard<'_>> {
        match self.timeout {
            None => Ok(self.lock.write()),
            Some(timeout) => self
                .lock
                .try_write_for(timeout)
                .ok_or(AppError::LockTimeout(timeout)),
        }
    }

    pub fn is_exclusively_held(&self) -> bool {
        self.lock.is_locked_exclusive()
    }
}
