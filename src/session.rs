//! One user's working state: the two loaded tables, the decode cache, the last merge
//! result and the merge history. Nothing here outlives the `Session` value.

use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

use crate::cache::TableCache;
use crate::error::{SheetMergeError, SheetMergeResult, TableSide};
use crate::export::{save_xlsx, ExportOptions};
use crate::history::{HistoryEntry, HistoryLog};
use crate::loader::{load_workbook, read_workbook_file, LoadedTable};
use crate::merge::{merge, JoinConfig, MergeOptions};

/// Output of the most recent successful merge.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub frame: DataFrame,
    pub config: JoinConfig,
    pub timestamp: NaiveDateTime,
}

#[derive(Default)]
pub struct Session {
    primary: Option<LoadedTable>,
    source: Option<LoadedTable>,
    cache: TableCache,
    history: HistoryLog,
    result: Option<MergeResult>,
    merge_options: MergeOptions,
    export_options: ExportOptions,
}

impl Session {
    pub fn new(merge_options: MergeOptions, export_options: ExportOptions) -> Self {
        Self {
            merge_options,
            export_options,
            ..Self::default()
        }
    }

    pub fn merge_options(&self) -> &MergeOptions {
        &self.merge_options
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    pub fn table(&self, side: TableSide) -> Option<&LoadedTable> {
        match side {
            TableSide::Primary => self.primary.as_ref(),
            TableSide::Source => self.source.as_ref(),
        }
    }

    pub fn primary(&self) -> Option<&LoadedTable> {
        self.primary.as_ref()
    }

    pub fn source(&self) -> Option<&LoadedTable> {
        self.source.as_ref()
    }

    /// Decode `bytes` into the given slot. On failure the slot keeps its previous table.
    /// A successful load discards the previous merge result.
    pub fn load_bytes(
        &mut self,
        side: TableSide,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> SheetMergeResult<&LoadedTable> {
        let name = name.into();
        let (digest, frame) = self.cache.get_or_load(bytes, load_workbook)?;
        tracing::info!(
            table = %side,
            name = %name,
            rows = frame.height(),
            cols = frame.width(),
            "loaded workbook"
        );
        let slot = match side {
            TableSide::Primary => &mut self.primary,
            TableSide::Source => &mut self.source,
        };
        self.result = None;
        Ok(slot.insert(LoadedTable {
            name,
            digest,
            frame,
        }))
    }

    pub fn load_path(&mut self, side: TableSide, path: &Path) -> SheetMergeResult<&LoadedTable> {
        let (name, bytes) = read_workbook_file(path)?;
        self.load_bytes(side, name, &bytes)
    }

    /// Merge the loaded tables. History is recorded only when the merge succeeds.
    pub fn run_merge(
        &mut self,
        config: &JoinConfig,
        now: NaiveDateTime,
    ) -> SheetMergeResult<&MergeResult> {
        let (Some(primary), Some(source)) = (&self.primary, &self.source) else {
            return Err(SheetMergeError::Configuration(
                "Load both workbooks before merging".to_string(),
            ));
        };
        let frame = merge(&primary.frame, &source.frame, config, &self.merge_options)?;
        self.history.record(HistoryEntry {
            timestamp: now,
            primary_name: primary.name.clone(),
            source_name: source.name.clone(),
            selected_count: config.selected_columns.len(),
            row_count: frame.height(),
        });
        Ok(self.result.insert(MergeResult {
            frame,
            config: config.clone(),
            timestamp: now,
        }))
    }

    pub fn result(&self) -> Option<&MergeResult> {
        self.result.as_ref()
    }

    /// Write the last merge result to `dir` under a timestamped name.
    pub fn export_result(&self, dir: &Path, now: NaiveDateTime) -> SheetMergeResult<PathBuf> {
        let Some(result) = &self.result else {
            return Err(SheetMergeError::Export(
                "Nothing to save: run a merge first".to_string(),
            ));
        };
        let file_name = self.export_options.file_name(now)?;
        save_xlsx(&result.frame, dir, &file_name)
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Back to a fresh session: tables, result, cache and history are all dropped.
    pub fn reset(&mut self) {
        self.primary = None;
        self.source = None;
        self.result = None;
        self.cache.invalidate();
        self.history.clear();
        tracing::info!("session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::write_xlsx;
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn workbook(df: &DataFrame) -> Vec<u8> {
        write_xlsx(df).unwrap()
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let mut session = Session::default();
        let good = workbook(&df!("id" => ["1"]).unwrap());
        session
            .load_bytes(TableSide::Primary, "a.xlsx", &good)
            .unwrap();
        let err = session
            .load_bytes(TableSide::Primary, "junk.xlsx", b"junk")
            .unwrap_err();
        assert!(matches!(err, SheetMergeError::FileFormat(_)));
        assert_eq!(session.primary().unwrap().name, "a.xlsx");
    }

    #[test]
    fn test_merge_needs_both_tables() {
        let mut session = Session::default();
        let err = session
            .run_merge(&JoinConfig::new("id", "sku", ["qty"]), now())
            .unwrap_err();
        assert!(err.is_warning());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_reloading_same_bytes_hits_cache() {
        let mut session = Session::default();
        let bytes = workbook(&df!("id" => ["1"]).unwrap());
        session.load_bytes(TableSide::Primary, "a.xlsx", &bytes).unwrap();
        session.load_bytes(TableSide::Source, "copy.xlsx", &bytes).unwrap();
        assert_eq!(session.cache().hits(), 1);
        assert_eq!(session.source().unwrap().name, "copy.xlsx");
    }

    #[test]
    fn test_export_without_result_fails() {
        let session = Session::default();
        let dir = tempfile::TempDir::new().unwrap();
        let err = session.export_result(dir.path(), now()).unwrap_err();
        assert!(matches!(err, SheetMergeError::Export(_)));
    }
}
