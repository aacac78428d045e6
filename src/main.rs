//! Favorite Exporter - export favorited photos from a date range
//!
//! A CLI tool that copies the favorited photos and live photo videos of a
//! date range into one folder, named in capture order, with optional
//! selfie mirroring.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use favorite_exporter::export::{ExportOutcome, ExportReport, MotionOutcome, StillOutcome};
use favorite_exporter::mirror::AssetMirror;
use favorite_exporter::{
    Cli, Config, DateRange, Exporter, FfmpegTranscoder, ManifestLibrary, RunContext, prompt,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Console styling for the run summary

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let width: usize = 60;
        let padding = width.saturating_sub(title.len()) / 2;
        let left_pad = " ".repeat(padding.saturating_sub(1));

        let _ = stdout().execute(Print(&format!(
            "{}{} {}{}\n",
            left_pad,
            "╔".bold().stylize(),
            title.bold().stylize(),
            "╗".bold().stylize(),
        )));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_key_value(key: &str, value: &str, value_color: Option<Color>) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = match value_color {
            Some(color) => style(value).with(color),
            None => style(value).bold(),
        };
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_stat(key: &str, value: usize, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value.to_string()).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// One line of the per-item listing
    pub fn print_result(status_icon: &str, status_color: Color, source: &str, dest_or_msg: &str) {
        let icon_styled = style(status_icon).with(status_color).bold();
        let source_styled = style(source).italic();
        let msg_styled = style(dest_or_msg).with(CliTheme::HINT);

        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(icon_styled));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(source_styled));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(msg_styled));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print("\n"));
        let _ = stdout().execute(Print(style("  📁 ").with(CliTheme::ACCENT)));
        let _ = stdout().execute(Print(style("Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.sample_config {
        print!("{}", Config::sample_config());
        return ExitCode::SUCCESS;
    }

    // The log guard lives inside `run`, so the file is flushed before exit
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            cli_output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {

    // Get the executable directory for Config and Log directories
    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, cli);
    let _guard = setup_logging(cli, &log_path)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Favorite Exporter starting"
    );

    let mut config = load_config(cli, &exe_dir)?;
    if let Err(message) = config.validate() {
        return Ok(fail(&favorite_exporter::Error::Config(message).to_string()));
    }

    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    if let Some(ref path) = cli.save_config {
        config.save_to_file(path)?;
        info!(config_file = %path.display(), "Configuration saved");
        cli_output::print_hint(&format!("Configuration saved to {}", path.display()));
        return Ok(ExitCode::SUCCESS);
    }
    info!(log_file = %log_path.display(), "Log file location");

    // Range problems end the run before anything is read or written
    let range = match resolve_range(cli, &mut config) {
        Ok(range) => range,
        Err(e) => return Ok(fail(&e.to_string())),
    };
    info!(range = %range, "Resolved date range");

    let library_path = config.library_path();
    let library = match ManifestLibrary::open(&library_path) {
        Ok(library) => library.with_operation(config.operation),
        Err(e) => return Ok(fail(&e.to_string())),
    };

    let transcoder = FfmpegTranscoder::new(config.ffmpeg_path.clone());
    if config.mirror_selfies && !transcoder.is_available() {
        warn!(
            ffmpeg = %config.ffmpeg_path.display(),
            "FFmpeg not found, selfie videos will not be mirrored"
        );
        cli_output::print_warning("FFmpeg not found: selfie videos will be exported unmirrored");
    }

    let destination = config.resolve_output_dir(&range);
    let dry_run = config.dry_run;
    let exporter = Exporter::with_transcoder(config, destination, Box::new(transcoder));

    let mut ctx = RunContext::new(true);
    let outcome = exporter.run(&mut ctx, &library, &range);
    ctx.finish();

    match outcome {
        Ok(report) => {
            print_summary(&report, &range, cli.verbose, dry_run);

            cli_output::print_separator();
            cli_output::print_log_path(&log_path.display().to_string());
            info!(log_file = %log_path.display(), "Export complete. Log saved to");

            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(fail(&format!("Export failed: {}", e))),
    }
}

/// Range from the command line, or from prompts on a terminal
fn resolve_range(cli: &Cli, config: &mut Config) -> favorite_exporter::Result<DateRange> {
    if let Some(range) = cli.resolve_range()? {
        return Ok(range);
    }

    if !prompt::should_prompt(cli.has_range()) {
        return Err(favorite_exporter::Error::MissingStartDate);
    }

    let answers = prompt::ask(config.exclude_live_stills)?;
    config.exclude_live_stills = answers.exclude_live_stills;
    answers.range()
}

/// Report a fatal setup error; the caller returns the code from `run`
fn fail(message: &str) -> ExitCode {
    error!(error = %message, "Aborting export");
    cli_output::print_error(message);
    ExitCode::FAILURE
}

fn print_summary(report: &ExportReport, range: &DateRange, verbose: bool, dry_run: bool) {
    use cli_output::*;

    let stats = &report.stats;

    print_separator();
    print_title("Export Complete");
    print_separator();

    print_blank();
    print_key_value("Range", &range.to_string(), None);
    print_key_value(
        "Destination",
        &report.destination.display().to_string(),
        Some(CliTheme::ACCENT),
    );
    print_blank();
    print_stat("Favorites", stats.total_items, CliTheme::ACCENT);
    print_stat("Stills exported", stats.stills_exported, CliTheme::SUCCESS);
    print_stat("Stills skipped", stats.stills_skipped, CliTheme::WARNING);
    print_stat("Videos exported", stats.motion_exported, CliTheme::SUCCESS);
    print_stat("Videos missing", stats.motion_missing, CliTheme::WARNING);
    print_stat("Mirrored", stats.mirrored, CliTheme::SUCCESS);
    print_stat("Already mirrored", stats.already_mirrored, CliTheme::ACCENT);
    print_stat("Mirror failures", stats.mirror_failed, CliTheme::WARNING);
    print_stat("Failed", stats.failed, CliTheme::ERROR);
    print_blank();

    if verbose {
        print_separator();
        print_hint("Detailed results");
        print_blank();

        for result in &report.results {
            let label = format!("{:03} {}", result.plan.index, result.original_filename);
            match &result.outcome {
                ExportOutcome::Exported { still, motion } => {
                    let mut written = Vec::new();
                    if let StillOutcome::Exported(path) = still {
                        written.push(display_name(path));
                    }
                    if let MotionOutcome::Exported(path) = motion {
                        written.push(display_name(path));
                    }
                    if matches!(motion, MotionOutcome::Missing) {
                        written.push("(video missing)".to_string());
                    }
                    if let Some(mirror) = &result.mirror
                        && mirror.primary == AssetMirror::Mirrored
                    {
                        written.push("(mirrored)".to_string());
                    }
                    print_result(
                        "✓",
                        CliTheme::SUCCESS,
                        &label,
                        &format!("→ {}", written.join(", ")),
                    );
                }
                ExportOutcome::Planned => {
                    let mut planned = vec![result.plan.still_name.clone()];
                    if result.plan.skip_still {
                        planned.clear();
                    }
                    planned.extend(result.plan.motion_name.iter().cloned());
                    print_result(
                        "~",
                        CliTheme::ACCENT,
                        &label,
                        &format!("→ {}", planned.join(", ")),
                    );
                }
                ExportOutcome::Failed { error } => {
                    print_result("✗", CliTheme::ERROR, &label, error);
                }
            }
        }
    }

    let failed: Vec<_> = report.failed().collect();
    if !failed.is_empty() {
        print_separator();
        print_error(&format!("Failed items: {}", failed.len()));
        print_blank();
        for result in &failed {
            if let ExportOutcome::Failed { error } = &result.outcome {
                print_key_value(
                    &format!("{:03} {}", result.plan.index, result.original_filename),
                    error,
                    Some(CliTheme::ERROR),
                );
            }
        }
    }

    if dry_run {
        print_separator();
        print_warning("Dry run: no files were written");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        let config_log_dir = log_dir.join(&config_name);
        let log_filename = format!("{}_{}.log", config_name, timestamp);
        config_log_dir.join(log_filename)
    } else {
        let log_filename = format!("Export_{}.log", timestamp);
        log_dir.join(log_filename)
    }
}

/// Resolve config path - supports shorthand syntax
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let with_extension = if config_path.extension().is_none() {
        config_path.with_extension("toml")
    } else {
        config_path.to_path_buf()
    };

    if with_extension.exists() {
        return with_extension;
    }

    let config_dir = exe_dir.join("Config");
    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());

    let mut in_config_dir = config_dir.join(filename);
    if in_config_dir.extension().is_none() {
        in_config_dir = in_config_dir.with_extension("toml");
    }

    if in_config_dir.exists() {
        return in_config_dir;
    }

    config_path.to_path_buf()
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli, exe_dir: &Path) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let resolved_path = resolve_config_path(exe_dir, config_path);
        info!(config_file = %resolved_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(&resolved_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(Some(guard))
}
