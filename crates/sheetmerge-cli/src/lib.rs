//! Shared CLI definitions for sheetmerge.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::Path;

/// Workbook container recognised by file extension.
/// Files with no or an unknown extension are still sniffed by content when loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Office Open XML workbook (.xlsx)
    Xlsx,
    /// Macro-enabled Office Open XML workbook (.xlsm)
    Xlsm,
    /// Binary workbook (.xlsb)
    Xlsb,
    /// Legacy BIFF workbook (.xls)
    Xls,
    /// OpenDocument spreadsheet (.ods)
    Ods,
}

impl WorkbookFormat {
    /// Detect workbook format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "xlsx", "xls").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            "xlsb" => Some(Self::Xlsb),
            "xls" => Some(Self::Xls),
            "ods" => Some(Self::Ods),
            _ => None,
        }
    }

    /// True for extensions that clearly name some other kind of file (e.g. ".csv", ".txt").
    pub fn is_foreign_extension(path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext).is_none(),
            None => false,
        }
    }
}

/// How to treat several source rows sharing one key
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// One output row per matching source row (standard left join)
    Expand,
    /// Keep only the first matching source row
    First,
    /// Keep only the last matching source row
    Last,
}

/// Command-line arguments for sheetmerge
#[derive(Clone, Parser, Debug)]
#[command(
    name = "sheetmerge",
    version,
    about = "Merge two spreadsheets on a key column",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Primary workbook (every row is kept)
    #[arg(value_name = "PRIMARY")]
    pub primary: Option<std::path::PathBuf>,

    /// Source workbook (columns are copied from here)
    #[arg(value_name = "SOURCE")]
    pub source: Option<std::path::PathBuf>,

    /// Key column in the primary workbook. Together with --key-b and --columns, runs the merge without the UI
    #[arg(long = "key-a", value_name = "COLUMN", requires_all = ["key_b", "columns", "primary", "source"])]
    pub key_a: Option<String>,

    /// Key column in the source workbook
    #[arg(long = "key-b", value_name = "COLUMN", requires = "key_a")]
    pub key_b: Option<String>,

    /// Source columns to copy, in output order (comma separated or repeated)
    #[arg(long = "columns", value_name = "COLUMN", value_delimiter = ',', num_args = 1.., requires = "key_a")]
    pub columns: Vec<String>,

    /// Directory for the merged workbook (default: config export.output_dir, else current directory)
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<std::path::PathBuf>,

    /// How to treat several source rows with the same key (overrides config merge.duplicate_keys)
    #[arg(long = "duplicate-keys", value_enum)]
    pub duplicate_keys: Option<DuplicateKeys>,

    /// Enable debug mode: debug overlay in the UI and debug-level logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/sheetmerge/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

impl Args {
    /// True when enough was given on the command line to merge without the UI.
    pub fn is_batch(&self) -> bool {
        self.key_a.is_some() && self.key_b.is_some() && !self.columns.is_empty()
    }
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
