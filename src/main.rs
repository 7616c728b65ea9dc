//! Purpose: `orderlite` CLI entry point and command parsing.
//! Role: Binary crate root; parses args, runs commands, emits output on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr when not a TTY.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
//! Invariants: All table mutations go through `core::store::RecordStore`
//! (locks + save-on-mutation).
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use std::time::{SystemTime, UNIX_EPOCH};

mod color_json;
mod command_dispatch;
mod menu;
mod render;
mod store_paths;

use color_json::colorize_json;
use orderlite::core::error::{Error, ErrorKind, to_exit_code};
use orderlite::core::store::{RecordStore, SkipReason, SkippedColumn};
use orderlite::notice::{Notice, notice_json};
use store_paths::resolve_store_path;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `orderlite --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let store_path = resolve_store_path(cli.file);
    let color_mode = cli.color;

    command_dispatch::dispatch_command(cli.command, store_path, color_mode)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "orderlite",
    version,
    about = "Product-order records kept in a flat tabular file",
    long_about = None,
    after_help = r#"EXAMPLES
  $ orderlite menu
  $ orderlite add "Ann" "1 Main St" "Widget" "A widget" "Acme" 10 9.99 0% 2025-01-01 2025-01-05
  $ orderlite show
  $ orderlite modify 1 --set price=12.50 --set discount=5%
  $ orderlite delete 1
  $ orderlite delete --where customer_name=Bob

The storage file defaults to ./orders.orderlite and is created on first use."#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        help = "Storage file (default: ./orders.orderlite)",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Interactive numbered menu (show/add/modify/delete)")]
    Menu,
    #[command(about = "Show all entries")]
    Show {
        #[arg(long, help = "Emit rows as JSON instead of an aligned table")]
        json: bool,
    },
    #[command(about = "Add one entry; pass every data column value in order")]
    Add {
        #[arg(
            required = true,
            help = "Values for the data columns, in schema order (id is generated)"
        )]
        values: Vec<String>,
    },
    #[command(about = "Modify one entry by id")]
    Modify {
        #[arg(help = "Entry id")]
        id: i64,
        #[arg(
            long = "set",
            value_name = "COLUMN=VALUE",
            required = true,
            help = "Column update; repeatable"
        )]
        set: Vec<String>,
    },
    #[command(about = "Delete one entry by id, or rows matching --where criteria")]
    Delete {
        #[arg(help = "Entry id")]
        id: Option<i64>,
        #[arg(
            long = "where",
            value_name = "COLUMN=VALUE",
            help = "Equality criterion; repeatable, unknown columns are skipped"
        )]
        criteria: Vec<String>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), Error> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("`{raw}` is not a COLUMN=VALUE assignment"))
            .with_hint("Use the form column=value, e.g. price=12.50.")),
    }
}

fn parse_assignments(raw: &[String]) -> Result<Vec<(String, String)>, Error> {
    raw.iter().map(|item| parse_assignment(item)).collect()
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let json = if is_tty || use_color {
        colorize_json(&value, use_color)
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {} (store: {})", notice.message, notice.store);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn make_notice(kind: &str, cmd: &str, store: &std::path::Path, message: String) -> Notice {
    Notice {
        kind: kind.to_string(),
        time: notice_time_now().unwrap_or_default(),
        cmd: cmd.to_string(),
        store: store.display().to_string(),
        message,
        details: Map::new(),
    }
}

fn skipped_column_message(skipped: &SkippedColumn) -> String {
    match skipped.reason {
        SkipReason::UnknownColumn => format!("column {} not in schema", skipped.column),
        SkipReason::GeneratedId => {
            format!("column {} is generated and cannot be set", skipped.column)
        }
    }
}

fn emit_skip_notices(
    cmd: &str,
    store: &std::path::Path,
    skipped: &[SkippedColumn],
    color_mode: ColorMode,
) {
    for item in skipped {
        let mut notice = make_notice("column-skipped", cmd, store, skipped_column_message(item));
        notice
            .details
            .insert("column".to_string(), Value::from(item.column.clone()));
        emit_notice(&notice, color_mode);
    }
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Validation => "invalid entry".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::UnknownColumn => "unknown column".to_string(),
        ErrorKind::Busy => "storage file is busy".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Corrupt => "corrupt storage file".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(id) = err.id() {
        inner.insert("id".to_string(), json!(id));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("file:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(id) = err.id() {
        lines.push(format!(
            "{} {id}",
            colorize_label("id:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[cfg(test)]
mod tests {
    use super::{error_json, error_text, parse_assignment, parse_assignments};
    use orderlite::core::error::{Error, ErrorKind};

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        let (column, value) = parse_assignment("discount=a=b").expect("assignment");
        assert_eq!(column, "discount");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn parse_assignment_rejects_missing_column() {
        let err = parse_assignment("=value").expect_err("no column");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = parse_assignment("no-equals").expect_err("no equals");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn parse_assignments_collects_in_order() {
        let raw = vec!["a=1".to_string(), "b=2".to_string()];
        let parsed = parse_assignments(&raw).expect("assignments");
        assert_eq!(
            parsed,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn error_surfaces_cover_context_fields() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("no entry with that id")
            .with_id(9)
            .with_hint("List entries with `orderlite show`.");
        let text = error_text(&err, false);
        assert!(text.contains("error: no entry with that id"));
        assert!(text.contains("hint:"));
        assert!(text.contains("id: 9"));

        let value = error_json(&err);
        let inner = value.get("error").expect("error object");
        assert_eq!(inner.get("kind").unwrap(), "NotFound");
        assert_eq!(inner.get("id").unwrap(), 9);
    }
}
