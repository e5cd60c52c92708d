// src/db/constraints.rs
//
// Scoped relaxation of referential integrity, for bulk maintenance
// passes that break references mid-operation.
//
// SQLite ignores `PRAGMA foreign_keys` while a transaction is open, so
// inside a write transaction relaxation is `defer_foreign_keys`: no
// foreign key check fires while the guard lives. Dropping the guard
// switches immediate checking back on, whatever happened in between.
// References the bulk pass leaves broken are its own responsibility;
// `verify_database_integrity` reports them.
//
// Only a write transaction can hand one out, and the exclusive lock
// means only one write transaction exists system-wide.

use rusqlite::Connection;
use std::cell::Cell;

use crate::db::session::WriteTransaction;
use crate::error::{AppError, AppResult};

pub struct ConstraintRelaxation<'t> {
    conn: &'t Connection,
    engaged: &'t Cell<bool>,
}

impl WriteTransaction<'_> {
    /// Suspend foreign key enforcement until the returned guard drops
    pub fn relax_constraints(&self) -> AppResult<ConstraintRelaxation<'_>> {
        if self.relaxed.get() {
            return Err(AppError::usage(
                "constraint relaxation is already engaged on this transaction",
            ));
        }

        self.conn.execute_batch("PRAGMA defer_foreign_keys = ON")?;
        self.relaxed.set(true);
        log::debug!("Foreign key enforcement deferred");

        Ok(ConstraintRelaxation {
            conn: &*self.conn,
            engaged: &self.relaxed,
        })
    }

    /// Run `f` with constraints relaxed; enforcement is restored on
    /// every exit path, including when `f` fails.
    pub fn with_relaxed_constraints<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Self) -> AppResult<T>,
    {
        let _relaxed = self.relax_constraints()?;
        f(self)
    }

    pub fn constraints_relaxed(&self) -> bool {
        self.relaxed.get()
    }
}

impl Drop for ConstraintRelaxation<'_> {
    fn drop(&mut self) {
        match self.conn.execute_batch("PRAGMA defer_foreign_keys = OFF") {
            Ok(()) => log::debug!("Foreign key enforcement restored"),
            Err(e) => log::error!("Failed to restore foreign key enforcement: {}", e),
        }
        self.engaged.set(false);
    }
}
