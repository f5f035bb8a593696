//! Change-gated writes: a table is only sent when its serialized grid
//! differs from what the tab is known to hold.

use log::{debug, info};
use smartspread_backend::{SheetBackend, WriteMode};
use smartspread_engine::{to_grid, Fingerprint, TypedTable};

use crate::cache::FingerprintCache;
use crate::error::Error;

/// Options for [`crate::Tab::write_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub mode: WriteMode,
    /// Format the tab as a table (filter, frozen bold header) after writing.
    pub as_table: bool,
    /// Write even when the content is unchanged.
    pub force: bool,
}

impl WriteOptions {
    pub fn overwrite() -> Self {
        Self {
            mode: WriteMode::Overwrite,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// False when the gate skipped the write.
    pub written: bool,
    pub fingerprint: Fingerprint,
}

/// Serialize `table`, compare against the cached fingerprint for `tab`,
/// and write only on a difference (or when `force` is set).
///
/// The cache is updated only after the backend reports success; a failed
/// write leaves it as it was.
pub fn write_if_changed<B: SheetBackend + ?Sized>(
    backend: &B,
    cache: &mut FingerprintCache,
    tab: &str,
    table: &TypedTable,
    mode: WriteMode,
    force: bool,
) -> Result<WriteOutcome, Error> {
    let grid = to_grid(table)?;
    let fingerprint = Fingerprint::of_grid(&grid);

    if !force && cache.get(tab) == Some(&fingerprint) {
        debug!("Data for tab '{}' has not changed", tab);
        return Ok(WriteOutcome {
            written: false,
            fingerprint,
        });
    }

    backend.write_grid(tab, &grid, mode)?;
    cache.set(tab, fingerprint.clone());
    info!("Wrote {} rows to '{}' ({:?})", grid.len().saturating_sub(1), tab, mode);

    Ok(WriteOutcome {
        written: true,
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartspread_backend::{BackendError, MemoryBackend, ValueRender};
    use smartspread_engine::{normalize, DataFormat, EngineError, Frame, Grid, Value};

    fn g(rows: &[&[&str]]) -> Grid {
        rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    fn table() -> TypedTable {
        let mut f = Frame::with_headers(["ID", "Status"]);
        f.push_row(vec![Value::Int(1), Value::text("open")]).unwrap();
        TypedTable::from(f)
    }

    #[test]
    fn test_first_write_goes_through_then_gates() {
        let backend = MemoryBackend::new("t").with_tab("S", Grid::new());
        let mut cache = FingerprintCache::new();

        let first = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap();
        assert!(first.written);
        assert_eq!(cache.get("S"), Some(&first.fingerprint));

        let second = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap();
        assert!(!second.written);
        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.grid("S").unwrap(), g(&[&["ID", "Status"], &["1", "open"]]));
    }

    #[test]
    fn test_unchanged_after_read_is_noop() {
        let backend = MemoryBackend::new("t").with_tab("S", g(&[&["ID", "Status"], &["1.0", "open"]]));
        let mut cache = FingerprintCache::new();

        // Seed the way a tab read does: fingerprint of the re-serialized table
        let grid = backend.read_grid("S", ValueRender::Unformatted).unwrap();
        let read = normalize(&grid, DataFormat::Records).unwrap();
        cache.set("S", Fingerprint::of_table(&read).unwrap());

        let outcome = write_if_changed(&backend, &mut cache, "S", &read, WriteMode::Range, false).unwrap();
        assert!(!outcome.written);
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_failure_leaves_cache_untouched() {
        let backend = MemoryBackend::new("t").with_tab("S", Grid::new());
        let mut cache = FingerprintCache::new();
        backend.fail_next_write(BackendError::Network("connection reset".into()));

        let err = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap_err();
        assert_eq!(err, Error::Backend(BackendError::Network("connection reset".into())));
        assert!(cache.get("S").is_none());

        // Retry with the same data is not suppressed
        let retry = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap();
        assert!(retry.written);
        assert_eq!(backend.write_count(), 1);
    }

    #[test]
    fn test_failure_keeps_previous_fingerprint() {
        let backend = MemoryBackend::new("t").with_tab("S", Grid::new());
        let mut cache = FingerprintCache::new();
        let before = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap();

        let mut changed = table();
        changed.with_frame_mut(|f| {
            f.set(0, 1, Value::text("done"));
            Ok(())
        })
        .unwrap();
        backend.fail_next_write(BackendError::Http(500, "backend error".into()));
        assert!(write_if_changed(&backend, &mut cache, "S", &changed, WriteMode::Range, false).is_err());
        assert_eq!(cache.get("S"), Some(&before.fingerprint));
    }

    #[test]
    fn test_force_bypasses_gate() {
        let backend = MemoryBackend::new("t").with_tab("S", Grid::new());
        let mut cache = FingerprintCache::new();
        write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap();

        let forced = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Overwrite, true).unwrap();
        assert!(forced.written);
        assert_eq!(backend.write_count(), 2);
    }

    #[test]
    fn test_mode_does_not_affect_gate() {
        let backend = MemoryBackend::new("t").with_tab("S", Grid::new());
        let mut cache = FingerprintCache::new();
        write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Range, false).unwrap();
        let again = write_if_changed(&backend, &mut cache, "S", &table(), WriteMode::Overwrite, false).unwrap();
        assert!(!again.written);
    }

    #[test]
    fn test_empty_table_never_reaches_backend() {
        let backend = MemoryBackend::new("t").with_tab("S", Grid::new());
        let mut cache = FingerprintCache::new();
        let err = write_if_changed(
            &backend,
            &mut cache,
            "S",
            &TypedTable::empty(DataFormat::Records),
            WriteMode::Range,
            true,
        )
        .unwrap_err();
        assert_eq!(err, Error::Engine(EngineError::EmptyData));
        assert_eq!(backend.write_count(), 0);
    }
}
