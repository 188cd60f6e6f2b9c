use chrono::NaiveDateTime;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use sheetmerge::error_display::user_message_from_report;
use sheetmerge::logging::{default_log_path, init_logging, LogTarget};
use sheetmerge::{
    AppConfig, ConfigManager, JoinConfig, Session, SheetMergeResult, TableSide, APP_NAME,
};
use sheetmerge_cli::Args;
use std::path::{Path, PathBuf};

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error writing configuration: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

/// Command line values override the loaded configuration.
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(policy) = args.duplicate_keys {
        config.merge.duplicate_keys = policy.into();
    }
    if let Some(dir) = &args.output_dir {
        config.export.output_dir = Some(dir.display().to_string());
    }
    if args.debug {
        config.debug.enabled = true;
    }
}

fn merge_files(
    session: &mut Session,
    primary: &Path,
    source: &Path,
    join: &JoinConfig,
    output_dir: &Path,
    now: NaiveDateTime,
) -> SheetMergeResult<PathBuf> {
    session.load_path(TableSide::Primary, primary)?;
    session.load_path(TableSide::Source, source)?;
    session.run_merge(join, now)?;
    session.export_result(output_dir, now)
}

/// Load, merge and save without the UI, printing a summary.
fn run_batch(args: &Args, config: &AppConfig) -> Result<()> {
    let (Some(primary), Some(source), Some(key_a), Some(key_b)) =
        (&args.primary, &args.source, &args.key_a, &args.key_b)
    else {
        return Err(eyre!("Batch mode needs PRIMARY, SOURCE, --key-a, --key-b and --columns"));
    };

    let mut session = Session::new(config.merge_options(), config.export_options());
    let join = JoinConfig::new(key_a.as_str(), key_b.as_str(), args.columns.iter().cloned());
    let now = chrono::Local::now().naive_local();

    let saved = merge_files(&mut session, primary, source, &join, &config.output_dir(), now)?;

    if let Some(result) = session.result() {
        println!(
            "Merged {} rows, {} columns",
            result.frame.height(),
            result.frame.width()
        );
    }
    println!("Saved {}", saved.display());
    for entry in session.history().list() {
        println!(
            "{}  {} + {}  columns={} rows={}",
            entry.time_label(),
            entry.primary_name,
            entry.source_name,
            entry.selected_count,
            entry.row_count
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let mut config = AppConfig::load(APP_NAME)?;
    apply_overrides(&mut config, &args);
    let debug = config.debug.enabled;

    if args.is_batch() {
        init_logging(debug, LogTarget::Stderr)?;
        if let Err(e) = run_batch(&args, &config) {
            eprintln!("Error: {}", user_message_from_report(&e));
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(path) = default_log_path() {
        init_logging(debug, LogTarget::File(path))?;
    }
    if let Err(e) = sheetmerge::run(args.primary, args.source, config, debug) {
        eprintln!("Error: {}", user_message_from_report(&e));
        std::process::exit(1);
    }
    Ok(())
}
