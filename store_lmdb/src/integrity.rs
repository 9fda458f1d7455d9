//! Store integrity checks.
//!
//! `check_data_dir` runs before the environment is opened; `check_integrity`
//! can be run on an open store to confirm every table is readable.

use std::path::Path;

use btcb_store::StoreError;

use crate::environment::{names, open_legacy};
use crate::store::LmdbStore;
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub tables_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

impl LmdbStore {
    /// Open every current table and count its entries. Read failures and
    /// missing tables are recorded in the report.
    pub fn check_integrity(&self) -> Result<IntegrityReport, StoreError> {
        let mut report = IntegrityReport::default();
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;

        for &name in names::CURRENT {
            match open_legacy(&self.env, &rtxn, name) {
                Ok(Some(table)) => {
                    report.tables_checked += 1;
                    match table.len(&rtxn) {
                        Ok(count) => report.total_entries += count,
                        Err(e) => report
                            .errors
                            .push(format!("failed to read table '{}': {}", name, e)),
                    }
                }
                Ok(None) => report.errors.push(format!("table '{}' is missing", name)),
                Err(e) => report
                    .errors
                    .push(format!("failed to open table '{}': {}", name, e)),
            }
        }

        if !report.is_healthy() {
            tracing::warn!(errors = report.errors.len(), "store integrity check failed");
        }
        Ok(report)
    }
}

/// Check that `path` is usable as a store directory before opening.
///
/// A path that does not exist yet is fine. An existing path must be a
/// directory, and a directory that already has a lock file must also have
/// its data file.
pub fn check_data_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(StoreError::Initialization(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    if path.join("lock.mdb").exists() && !path.join("data.mdb").exists() {
        return Err(StoreError::Initialization(format!(
            "store directory has a lock file but data.mdb is missing at {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{open_test_store, test_genesis};

    #[test]
    fn fresh_path_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("new")).is_ok());
        assert!(check_data_dir(dir.path()).is_ok());
    }

    #[test]
    fn file_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            check_data_dir(&file),
            Err(StoreError::Initialization(_))
        ));
    }

    #[test]
    fn lock_without_data_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lock.mdb"), b"").unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn open_store_is_healthy() {
        let (_dir, store) = open_test_store();
        let mut txn = store.tx_begin_write().unwrap();
        store.initialize(&mut txn, &test_genesis()).unwrap();
        txn.commit().unwrap();

        let report = store.check_integrity().unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.tables_checked as usize, names::CURRENT.len());
        // Genesis block, account, frontier, weight and the version stamp.
        assert_eq!(report.total_entries, 5);
    }
}
