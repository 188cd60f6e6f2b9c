//! Left outer join of a primary table with selected columns of a source table.
//!
//! Keys on both sides are compared as trimmed text, so a numeric `1` in one workbook
//! matches the text `" 1 "` in the other. Every primary row is kept, in order; the
//! handling of several source rows sharing a key is set by [`DuplicateKeyPolicy`].

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use sheetmerge_cli::DuplicateKeys;
use std::collections::{HashMap, HashSet};

use crate::error::{SheetMergeError, SheetMergeResult, TableSide};

/// Suffix appended to a copied column whose name already exists in the primary table.
pub const DEFAULT_COLLISION_SUFFIX: &str = "_right";

/// What to do when more than one source row matches a primary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// One output row per match, matches in source order.
    #[default]
    Expand,
    First,
    Last,
}

impl DuplicateKeyPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

impl From<DuplicateKeys> for DuplicateKeyPolicy {
    fn from(value: DuplicateKeys) -> Self {
        match value {
            DuplicateKeys::Expand => Self::Expand,
            DuplicateKeys::First => Self::First,
            DuplicateKeys::Last => Self::Last,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub duplicate_keys: DuplicateKeyPolicy,
    pub collision_suffix: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::default(),
            collision_suffix: DEFAULT_COLLISION_SUFFIX.to_string(),
        }
    }
}

/// Key pair plus the source columns to copy, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinConfig {
    pub key_a: String,
    pub key_b: String,
    pub selected_columns: Vec<String>,
}

impl JoinConfig {
    pub fn new(
        key_a: impl Into<String>,
        key_b: impl Into<String>,
        selected_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            key_a: key_a.into(),
            key_b: key_b.into(),
            selected_columns: selected_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Check the configuration against both tables.
    pub fn validate(&self, primary: &DataFrame, source: &DataFrame) -> SheetMergeResult<()> {
        if self.selected_columns.is_empty() {
            return Err(SheetMergeError::Configuration(
                "No columns selected: choose at least one source column to copy".to_string(),
            ));
        }
        if !has_column(primary, &self.key_a) {
            return Err(SheetMergeError::MissingColumn {
                table: TableSide::Primary,
                column: self.key_a.clone(),
            });
        }
        if !has_column(source, &self.key_b) {
            return Err(SheetMergeError::MissingColumn {
                table: TableSide::Source,
                column: self.key_b.clone(),
            });
        }
        let mut seen = HashSet::new();
        for name in &self.selected_columns {
            if name == &self.key_b {
                return Err(SheetMergeError::Configuration(format!(
                    "'{}' is the source key column and cannot also be copied",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(SheetMergeError::Configuration(format!(
                    "'{}' is selected more than once",
                    name
                )));
            }
            if !has_column(source, name) {
                return Err(SheetMergeError::MissingColumn {
                    table: TableSide::Source,
                    column: name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Key normalization: string representation with surrounding whitespace removed.
/// Missing values stay missing. Applying it twice gives the same column.
///
/// Keys that end up empty are kept as `""` and join like any other text.
pub fn normalize_key(column: &Column) -> SheetMergeResult<Column> {
    let as_text = column.cast(&DataType::String)?;
    let normalized: StringChunked = as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim))
        .collect();
    Ok(normalized.with_name(column.name().clone()).into_column())
}

/// First free name among `base`, `base{suffix}`, `base{suffix}_2`, `base{suffix}_3`, ...
fn unique_name(base: &str, suffix: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let suffixed = format!("{}{}", base, suffix);
    if !taken.contains(&suffixed) {
        return suffixed;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", suffixed, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Row pairing for the join: `left[i]` is a primary row, `right[i]` the matching
/// source row or None.
struct RowPairs {
    left: Vec<IdxSize>,
    right: Vec<Option<IdxSize>>,
    matched: usize,
}

fn pair_rows(
    primary_keys: &StringChunked,
    source_keys: &StringChunked,
    policy: DuplicateKeyPolicy,
) -> RowPairs {
    let mut index: HashMap<&str, Vec<IdxSize>> = HashMap::new();
    for (row, key) in source_keys.into_iter().enumerate() {
        if let Some(key) = key {
            index.entry(key).or_default().push(row as IdxSize);
        }
    }

    let mut pairs = RowPairs {
        left: Vec::with_capacity(primary_keys.len()),
        right: Vec::with_capacity(primary_keys.len()),
        matched: 0,
    };
    for (row, key) in primary_keys.into_iter().enumerate() {
        let row = row as IdxSize;
        let matches = key.and_then(|k| index.get(k));
        let Some(matches) = matches else {
            pairs.left.push(row);
            pairs.right.push(None);
            continue;
        };
        pairs.matched += 1;
        match policy {
            DuplicateKeyPolicy::Expand => {
                for m in matches {
                    pairs.left.push(row);
                    pairs.right.push(Some(*m));
                }
            }
            DuplicateKeyPolicy::First => {
                pairs.left.push(row);
                pairs.right.push(matches.first().copied());
            }
            DuplicateKeyPolicy::Last => {
                pairs.left.push(row);
                pairs.right.push(matches.last().copied());
            }
        }
    }
    pairs
}

/// Left outer join of `primary` with `config.selected_columns` of `source`.
///
/// The output holds the primary columns in their original order (the key column holding
/// the normalized key), followed by the selected columns in selection order. Unmatched
/// primary rows get nulls. Neither input frame is modified.
pub fn merge(
    primary: &DataFrame,
    source: &DataFrame,
    config: &JoinConfig,
    options: &MergeOptions,
) -> SheetMergeResult<DataFrame> {
    config.validate(primary, source)?;

    let primary_keys = normalize_key(primary.column(&config.key_a)?)?;
    let source_keys = normalize_key(source.column(&config.key_b)?)?;

    let pairs = pair_rows(
        primary_keys.str()?,
        source_keys.str()?,
        options.duplicate_keys,
    );

    let mut left = primary.clone();
    left.with_column(primary_keys)?;
    let left_idx: IdxCa = pairs.left.iter().copied().map(Some).collect();
    let left = left.take(&left_idx)?;

    let reduced = source.select(config.selected_columns.iter().map(|s| s.as_str()))?;
    let right_idx: IdxCa = pairs.right.iter().copied().collect();
    let right = reduced.take(&right_idx)?;

    let mut taken: HashSet<String> = primary
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut copied: Vec<Column> = Vec::with_capacity(config.selected_columns.len());
    for name in &config.selected_columns {
        let out_name = unique_name(name, &options.collision_suffix, &taken);
        if &out_name != name {
            tracing::debug!(column = %name, renamed = %out_name, "column name collision");
        }
        taken.insert(out_name.clone());
        copied.push(right.column(name)?.clone().with_name(out_name.into()));
    }

    let merged = left.hstack(&copied).map_err(|e| {
        SheetMergeError::Merge(format!("Could not attach source columns: {}", e))
    })?;

    tracing::info!(
        primary_rows = primary.height(),
        source_rows = source.height(),
        matched = pairs.matched,
        unmatched = primary.height() - pairs.matched,
        output_rows = merged.height(),
        policy = options.duplicate_keys.as_str(),
        "merge complete"
    );
    Ok(merged)
}
