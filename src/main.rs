//! # Newsletter mail formatter (nlfmt)
//!
//! A CLI that prepares Japanese newsletter text for plain-text mail: it
//! applies text-correction rules, reflows lines to a column budget with
//! kinsoku rules, and assembles the newsletter from its template.
//!
//! ## Overview
//!
//! By default `nlfmt` reads files (or stdin), applies the fixes requested
//! with `--fix`/`--fix-all`, wraps every line to `--width` columns and
//! prints the result. `--check` only reports what the rules find.
//!
//! ## Pipeline
//!
//! ```text
//! Input → CRLF normalization → Rule fixes (in order) → Wrap → Output
//!                                   ↓
//!                        --check: Rule scan → Issue report
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | General error (file not found, permission denied, I/O error) |
//! | 2 | Invalid command-line arguments |
//! | 3 | Dry-run would change the input, or check found issues |
//! | 4 | Parse error (invalid UTF-8, binary input, malformed data file) |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::ValueEnum;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use nlfmt::{
    DEFAULT_MAX_CHARS_PER_LINE, FormatSettings, Issue, NewsletterData, TemplateVariables,
    Templates, TextRule,
};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rich_rust::terminal;
use rich_rust::{ColorSystem, Console};
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

// ─────────────────────────────────────────────────────────────────────────────
// Exit Codes
// ─────────────────────────────────────────────────────────────────────────────

/// Semantic exit codes for scripting and CI integration
mod exit_codes {
    /// Success - completed without errors
    pub const SUCCESS: i32 = 0;
    /// General error (file not found, permission denied, I/O error)
    pub const ERROR: i32 = 1;
    /// Invalid command-line arguments
    pub const INVALID_ARGS: i32 = 2;
    /// Dry-run would change the input, or check found issues
    pub const WOULD_CHANGE: i32 = 3;
    /// Parse error (invalid UTF-8, binary input, malformed data file)
    pub const PARSE_ERROR: i32 = 4;
}

#[derive(Debug)]
struct ArgError(String);

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ArgError {}

#[derive(Debug)]
struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug)]
struct RunOutcome {
    /// Dry-run or check mode: exit 3 signals pending work
    dry_run: bool,
    would_change: bool,
}

fn error_chain_has<T: std::error::Error + 'static>(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<T>())
}

fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    if error_chain_has::<ArgError>(err) {
        exit_codes::INVALID_ARGS
    } else if error_chain_has::<ParseError>(err) {
        exit_codes::PARSE_ERROR
    } else {
        exit_codes::ERROR
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CLI Arguments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ColorMode {
    /// Auto-detect color support
    Auto,
    /// Always emit colors (even when not a TTY)
    Always,
    /// Never emit colors
    Never,
}

/// Newsletter mail formatter: kinsoku-aware wrapping and text-correction rules
#[derive(Parser, Debug)]
#[command(
    name = "nlfmt",
    version,
    about,
    long_about = None,
    after_help = "EXIT CODES:\n  0  Success\n  1  General error (file not found, permission denied, I/O error)\n  2  Invalid command-line arguments\n  3  Dry-run would change the input, or --check found issues\n  4  Parse error (invalid UTF-8, binary input, malformed data file)\n"
)]
struct Args {
    /// Input file(s). Reads from stdin if not provided.
    /// Multiple files can be specified.
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Path to config file (default: search for .nlfmtrc)
    #[arg(long = "config", value_name = "FILE", global = true)]
    config_file: Option<PathBuf>,

    /// Ignore config files
    #[arg(long = "no-config", global = true)]
    no_config: bool,

    /// Maximum columns per line (full-width characters count as 2)
    #[arg(short = 'w', long, default_value_t = DEFAULT_MAX_CHARS_PER_LINE, global = true)]
    width: usize,

    /// Characters allowed to hang past the right margin
    #[arg(long = "drop-chars", value_name = "CHARS", global = true)]
    drop_chars: Option<String>,

    /// Characters that must not begin a line
    #[arg(long = "start-forbid", value_name = "CHARS", global = true)]
    start_forbid: Option<String>,

    /// Characters that must not end a line
    #[arg(long = "end-forbid", value_name = "CHARS", global = true)]
    end_forbid: Option<String>,

    /// Do not wrap lines (only apply fixes)
    #[arg(long = "no-wrap", global = true)]
    no_wrap: bool,

    /// Apply the fix of these rules before wrapping (comma-separated ids)
    #[arg(short = 'f', long = "fix", value_name = "RULE", value_delimiter = ',')]
    fix: Vec<String>,

    /// Apply the fixes of every rule
    #[arg(short = 'F', long = "fix-all", conflicts_with = "fix")]
    fix_all: bool,

    /// Rules used by --check (comma-separated ids, default: all)
    #[arg(short = 'R', long = "rules", value_name = "RULE", value_delimiter = ',')]
    rules: Vec<String>,

    /// Report rule issues without changing anything (exit 3 if any)
    #[arg(short = 'c', long, conflicts_with_all = ["in_place", "fix", "fix_all", "diff", "dry_run", "watch"])]
    check: bool,

    /// Edit file(s) in place
    #[arg(short = 'i', long)]
    in_place: bool,

    /// Verbose output showing formatting progress
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Color output: auto, always, or never
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorMode,

    /// Show unified diff of changes instead of full output
    #[arg(short = 'd', long)]
    diff: bool,

    /// Preview changes without modifying files (exit 0=no changes, 3=would change)
    #[arg(short = 'n', long, conflicts_with = "in_place")]
    dry_run: bool,

    /// Watch a file and re-format it every time it is saved
    #[arg(long, conflicts_with_all = ["in_place", "diff", "dry_run", "json"])]
    watch: bool,

    /// Debounce interval in milliseconds (for --watch mode)
    #[arg(long, default_value = "500", requires = "watch")]
    debounce_ms: u64,

    /// Create backup file before in-place editing
    #[arg(long, requires = "in_place")]
    backup: bool,

    /// Extension for backup files (default: .bak)
    #[arg(long, default_value = ".bak", requires = "backup")]
    backup_ext: String,

    /// Output results as JSON for programmatic processing
    #[arg(long, conflicts_with_all = ["verbose", "diff"])]
    json: bool,

    /// Subcommand (config, rules, generate)
    #[command(subcommand)]
    command: Option<Commands>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommands
// ─────────────────────────────────────────────────────────────────────────────

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the available text rules
    Rules,
    /// Assemble a newsletter from a data file and templates
    Generate(GenerateArgs),
}

/// Config management actions
#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Initialize a new .nlfmtrc config file
    Init {
        /// Create in home directory instead of current
        #[arg(long)]
        global: bool,
    },
    /// Show effective configuration (merged file + CLI)
    Show,
    /// Show path to active config file
    Path,
}

/// Inputs of the generate subcommand
#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Newsletter fields as JSON
    #[arg(long, value_name = "FILE")]
    data: PathBuf,

    /// Newsletter template with ${...} placeholders
    #[arg(long, value_name = "FILE")]
    template: PathBuf,

    /// Table-of-contents entry used when awards are present
    #[arg(long = "award-toc", value_name = "FILE")]
    award_toc: Option<PathBuf>,

    /// Award section template (${content} receives the awards text)
    #[arg(long, value_name = "FILE")]
    award: Option<PathBuf>,

    /// Text substituted for ${chair}
    #[arg(long, value_name = "FILE")]
    chair: Option<PathBuf>,

    /// Text substituted for ${committee}
    #[arg(long, value_name = "FILE")]
    committee: Option<PathBuf>,

    /// Write the newsletter here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration and Statistics
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime configuration derived from CLI args
#[derive(Debug)]
struct Config {
    settings: FormatSettings,
    wrap: bool,
    fix: Vec<String>,
    fix_all: bool,
    rules: Vec<String>,
    check: bool,
    color: ColorMode,
    verbose: bool,
    diff: bool,
    dry_run: bool,
    watch: bool,
    debounce_ms: u64,
    backup: bool,
    backup_ext: String,
    json: bool,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        let defaults = FormatSettings::default();
        Self {
            settings: FormatSettings {
                max_chars_per_line: args.width,
                drop_chars: args.drop_chars.clone().unwrap_or(defaults.drop_chars),
                line_start_forbid_chars: args
                    .start_forbid
                    .clone()
                    .unwrap_or(defaults.line_start_forbid_chars),
                line_end_forbid_chars: args
                    .end_forbid
                    .clone()
                    .unwrap_or(defaults.line_end_forbid_chars),
            },
            wrap: !args.no_wrap,
            fix: args.fix.clone(),
            fix_all: args.fix_all,
            rules: args.rules.clone(),
            check: args.check,
            color: args.color,
            verbose: args.verbose,
            diff: args.diff,
            dry_run: args.dry_run,
            watch: args.watch,
            debounce_ms: args.debounce_ms,
            backup: args.backup,
            backup_ext: args.backup_ext.clone(),
            json: args.json,
        }
    }
}

impl Config {
    /// Rules whose fixes run before wrapping, in the order requested
    fn fix_rules(&self) -> Result<Vec<&'static TextRule>> {
        if self.fix_all {
            return Ok(nlfmt::catalog().iter().collect());
        }
        nlfmt::select_rules(&self.fix).map_err(|err| ArgError(err.to_string()).into())
    }

    /// Rules used by --check; the whole catalog unless narrowed down
    fn scan_rules(&self) -> Result<Vec<&'static TextRule>> {
        if self.rules.is_empty() {
            return Ok(nlfmt::catalog().iter().collect());
        }
        nlfmt::select_rules(&self.rules).map_err(|err| ArgError(err.to_string()).into())
    }
}

struct VerboseStyle {
    use_color: bool,
}

impl VerboseStyle {
    fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn wrap(&self, tag: &str, text: impl fmt::Display) -> String {
        if self.use_color {
            format!("[{}]{}[/]", tag, text)
        } else {
            text.to_string()
        }
    }

    fn header(&self, text: impl fmt::Display) -> String {
        self.wrap("bold cyan", text)
    }

    fn rule(&self, text: impl fmt::Display) -> String {
        self.wrap("yellow", text)
    }

    fn success(&self, text: impl fmt::Display) -> String {
        self.wrap("bold green", text)
    }

    fn dim(&self, text: impl fmt::Display) -> String {
        self.wrap("dim", text)
    }

    fn bold(&self, text: impl fmt::Display) -> String {
        self.wrap("bold", text)
    }

    fn stat_label(&self, text: impl fmt::Display) -> String {
        self.wrap("bold blue", text)
    }

    fn separator(&self) -> String {
        self.wrap("dim", "───")
    }
}

/// Print a statistics summary to stderr
fn print_stats_summary(
    stats: &Stats,
    files_processed: usize,
    files_changed: usize,
    errors: usize,
    console: &Console,
    styles: &VerboseStyle,
) {
    console.print("");
    console.print(&format!(
        "{} Summary {}",
        styles.separator(),
        styles.separator()
    ));

    if files_processed > 1 {
        console.print(&format!(
            "  {} {} processed, {} modified, {} unchanged",
            styles.stat_label("Files:"),
            files_processed,
            files_changed,
            files_processed.saturating_sub(files_changed)
        ));
    }

    console.print(&format!(
        "  {} {} in, {} out ({} added by wrapping)",
        styles.stat_label("Lines:"),
        stats.lines_in,
        stats.lines_out,
        stats.lines_added()
    ));

    console.print(&format!(
        "  {} {} found, {} fixed",
        styles.stat_label("Issues:"),
        stats.issues_found,
        stats.fixes_applied
    ));

    let elapsed_ms = stats.elapsed.as_secs_f64() * 1000.0;
    console.print(&format!(
        "  {} {:.2}ms ({:.0} lines/sec)",
        styles.stat_label("Time:"),
        elapsed_ms,
        stats.lines_per_second()
    ));

    if errors > 0 {
        console.print(&format!(
            "  {} {}",
            styles.wrap("bold red", "Errors:"),
            errors
        ));
    }

    console.print("");
}

fn build_console(color: ColorMode) -> (Console, VerboseStyle) {
    match color {
        ColorMode::Never => (Console::new(), VerboseStyle::new(false)),
        ColorMode::Always => {
            let system = terminal::detect_color_system().unwrap_or(ColorSystem::Standard);
            let console = Console::builder()
                .force_terminal(true)
                .color_system(system)
                .build();
            (console, VerboseStyle::new(true))
        }
        ColorMode::Auto => {
            if std::env::var("NO_COLOR").is_ok() {
                return (Console::new(), VerboseStyle::new(false));
            }

            if std::env::var("FORCE_COLOR").is_ok() {
                let system = terminal::detect_color_system().unwrap_or(ColorSystem::Standard);
                let console = Console::builder()
                    .force_terminal(true)
                    .color_system(system)
                    .build();
                return (console, VerboseStyle::new(true));
            }

            let console = Console::new();
            let use_color = console.is_color_enabled();
            (console, VerboseStyle::new(use_color))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config File Support
// ─────────────────────────────────────────────────────────────────────────────

/// Config file names searched in order
const CONFIG_FILENAMES: &[&str] = &[".nlfmtrc", ".nlfmtrc.toml", "nlfmtrc.toml"];

/// Configuration loaded from a .nlfmtrc file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    /// Maximum columns per line
    width: Option<usize>,
    /// Hanging punctuation
    drop_chars: Option<String>,
    /// Characters that must not begin a line
    line_start_forbid: Option<String>,
    /// Characters that must not end a line
    line_end_forbid: Option<String>,
    /// Wrap lines after fixing
    wrap: Option<bool>,
    /// Rules used by --check
    rules: Option<Vec<String>>,
    /// Rules fixed on every run
    fix: Option<Vec<String>>,
    /// Show verbose output
    verbose: Option<bool>,
    /// Color mode: auto, always, never
    color: Option<ColorMode>,
    /// Output as JSON
    json: Option<bool>,
    /// Create backup before in-place edit
    backup: Option<bool>,
    /// Backup file extension
    backup_ext: Option<String>,
}

/// Search for a config file starting from the given directory
fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        for filename in CONFIG_FILENAMES {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    if let Some(home) = dirs::home_dir() {
        for filename in CONFIG_FILENAMES {
            let config_path = home.join(filename);
            if config_path.exists() {
                return Some(config_path);
            }
        }
    }

    None
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Apply file config values wherever the CLI kept its default (CLI wins)
fn merge_file_config(config: &mut Config, args: &Args, file_config: FileConfig) {
    if args.width == DEFAULT_MAX_CHARS_PER_LINE {
        if let Some(width) = file_config.width {
            config.settings.max_chars_per_line = width;
        }
    }

    if args.drop_chars.is_none() {
        if let Some(chars) = file_config.drop_chars {
            config.settings.drop_chars = chars;
        }
    }

    if args.start_forbid.is_none() {
        if let Some(chars) = file_config.line_start_forbid {
            config.settings.line_start_forbid_chars = chars;
        }
    }

    if args.end_forbid.is_none() {
        if let Some(chars) = file_config.line_end_forbid {
            config.settings.line_end_forbid_chars = chars;
        }
    }

    if !args.no_wrap {
        if let Some(wrap) = file_config.wrap {
            config.wrap = wrap;
        }
    }

    if args.rules.is_empty() {
        if let Some(rules) = file_config.rules {
            config.rules = rules;
        }
    }

    // Fixes from the file never apply in check mode
    if args.fix.is_empty() && !args.fix_all && !args.check {
        if let Some(fix) = file_config.fix {
            config.fix = fix;
        }
    }

    if !args.verbose {
        if let Some(v) = file_config.verbose {
            config.verbose = v;
        }
    }

    if args.color == ColorMode::Auto {
        if let Some(c) = file_config.color {
            config.color = c;
        }
    }

    if !args.json {
        if let Some(j) = file_config.json {
            config.json = j;
        }
    }

    if !args.backup {
        if let Some(b) = file_config.backup {
            config.backup = b;
        }
    }

    if args.backup_ext == ".bak" {
        if let Some(ext) = file_config.backup_ext {
            config.backup_ext = ext;
        }
    }
}

/// Create Config by merging file config with CLI args (CLI wins)
fn create_config(args: &Args) -> Result<Config> {
    let mut config = Config::from(args);

    if args.no_config {
        return Ok(config);
    }

    let config_path = if let Some(ref path) = args.config_file {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }
        Some(path.clone())
    } else {
        let start_dir = args
            .inputs
            .first()
            .and_then(|p| {
                if p.is_dir() {
                    Some(p.clone())
                } else {
                    p.parent().map(|p| p.to_path_buf())
                }
            })
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

        find_config_file(&start_dir)
    };

    if let Some(path) = config_path {
        let file_config = load_config_file(&path)?;
        merge_file_config(&mut config, args, file_config);
    }

    if config.settings.max_chars_per_line == 0 {
        return Err(ArgError("width must be at least 1".to_string()).into());
    }

    Ok(config)
}

/// Default config file content
const DEFAULT_CONFIG: &str = r#"# .nlfmtrc - nlfmt configuration file

# Maximum columns per line (full-width characters count as 2)
width = 75

# Kinsoku character sets
# drop_chars = ";・.､｡、。，．｣」』）〕］｝〉】"
# line_start_forbid = "]}):;?!ﾞﾟ”･~：；？！゛゜‐'\"）〕］｝〉」』】"
# line_end_forbid = "[{('\"“（〔［｛〈「『【「"

# Wrap lines after applying fixes
# wrap = true

# Rules checked by --check (default: all) and fixed on every run
# rules = ["full-width-alphanumeric", "punctuation", "url-format"]
# fix = ["full-width-alphanumeric"]

# Output options
# verbose = false
# color = "auto"
# json = false

# Backup options (for --in-place)
# backup = false
# backup_ext = ".bak"
"#;

/// Handle the config subcommand
fn run_config_command(action: &ConfigAction, args: &Args) -> Result<()> {
    match action {
        ConfigAction::Init { global } => {
            let path = if *global {
                dirs::home_dir()
                    .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
                    .join(".nlfmtrc")
            } else {
                PathBuf::from(".nlfmtrc")
            };

            if path.exists() {
                return Err(anyhow::anyhow!(
                    "Config file already exists: {}",
                    path.display()
                ));
            }

            fs::write(&path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to create config file: {}", path.display()))?;

            eprintln!("Created config file: {}", path.display());
            Ok(())
        }

        ConfigAction::Show => {
            let config = create_config(args)?;

            eprintln!("Effective configuration:");
            eprintln!("  width: {}", config.settings.max_chars_per_line);
            eprintln!("  drop_chars: {}", config.settings.drop_chars);
            eprintln!(
                "  line_start_forbid: {}",
                config.settings.line_start_forbid_chars
            );
            eprintln!("  line_end_forbid: {}", config.settings.line_end_forbid_chars);
            eprintln!("  wrap: {}", config.wrap);
            if config.rules.is_empty() {
                eprintln!("  rules: (all)");
            } else {
                eprintln!("  rules: {}", config.rules.join(","));
            }
            eprintln!("  fix: {}", config.fix.join(","));
            eprintln!("  verbose: {}", config.verbose);
            eprintln!("  color: {:?}", config.color);
            eprintln!("  json: {}", config.json);
            eprintln!("  backup: {}", config.backup);
            eprintln!("  backup_ext: {}", config.backup_ext);

            let start_dir = std::env::current_dir().unwrap_or_default();
            if let Some(path) = find_config_file(&start_dir) {
                eprintln!();
                eprintln!("Config file: {}", path.display());
            }

            Ok(())
        }

        ConfigAction::Path => {
            let start_dir = std::env::current_dir().unwrap_or_default();
            if let Some(path) = find_config_file(&start_dir) {
                println!("{}", path.display());
                Ok(())
            } else {
                eprintln!("No config file found");
                std::process::exit(exit_codes::ERROR);
            }
        }
    }
}

fn validate_args(args: &Args) -> Result<()> {
    if args.width == 0 {
        return Err(ArgError("--width must be at least 1".to_string()).into());
    }

    if args.in_place && args.inputs.is_empty() {
        return Err(ArgError("--in-place requires at least one input file".to_string()).into());
    }

    if args.watch && args.inputs.len() != 1 {
        return Err(ArgError("--watch requires exactly one input file".to_string()).into());
    }

    Ok(())
}

/// Statistics collected while formatting
#[derive(Default, Clone)]
struct Stats {
    /// Lines read
    lines_in: usize,
    /// Lines written
    lines_out: usize,
    /// Issues reported by the scanned rules
    issues_found: usize,
    /// Issues addressed by the applied fixes
    fixes_applied: usize,
    /// Processing elapsed time
    elapsed: Duration,
}

impl Stats {
    /// Merge another Stats into this one (for aggregating across files)
    fn merge(&mut self, other: &Stats) {
        self.lines_in += other.lines_in;
        self.lines_out += other.lines_out;
        self.issues_found += other.issues_found;
        self.fixes_applied += other.fixes_applied;
        self.elapsed += other.elapsed;
    }

    fn lines_added(&self) -> usize {
        self.lines_out.saturating_sub(self.lines_in)
    }

    /// Calculate lines processed per second
    fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines_in as f64 / secs
        } else {
            self.lines_in as f64
        }
    }
}

fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split('\n').count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON Output Structures
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonOutput {
    version: &'static str,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    input: InputStats,
    processing: ProcessingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<OutputStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Serialize)]
struct InputStats {
    lines: usize,
    bytes: usize,
}

#[derive(Serialize)]
struct ProcessingStats {
    fixes_applied: usize,
    lines_added: usize,
    wrapped: bool,
}

#[derive(Serialize)]
struct OutputStats {
    lines: usize,
    bytes: usize,
    changed: bool,
}

#[derive(Serialize)]
struct JsonCheckOutput {
    version: &'static str,
    status: &'static str,
    file: String,
    issues: Vec<JsonIssue>,
}

#[derive(Serialize)]
struct JsonIssue {
    id: &'static str,
    name: &'static str,
    count: usize,
    fixable: bool,
}

impl From<&Issue<'_>> for JsonIssue {
    fn from(issue: &Issue<'_>) -> Self {
        Self {
            id: issue.rule.id,
            name: issue.rule.name,
            count: issue.count,
            fixable: issue.rule.is_fixable(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Apply fixes and wrapping to one text
fn format_text(
    text: &str,
    config: &Config,
    fix_rules: &[&'static TextRule],
    console: &Console,
    styles: &VerboseStyle,
) -> (String, Stats) {
    let start_time = Instant::now();
    let mut stats = Stats {
        lines_in: count_lines(text),
        ..Stats::default()
    };

    let (mut formatted, applied) = nlfmt::apply_fixes(text, fix_rules.iter().copied());
    for issue in &applied {
        stats.issues_found += issue.count;
        stats.fixes_applied += issue.count;

        if config.verbose {
            console.print(&styles.rule(format!("  {}: {} fix(es)", issue.rule.id, issue.count)));
        }
    }

    if config.wrap {
        formatted = nlfmt::wrap(&formatted, &config.settings);
    }

    stats.lines_out = count_lines(&formatted);
    if config.verbose && config.wrap {
        console.print(
            &styles.dim(format!(
                "  Wrapped to {} columns: {} line(s) added",
                config.settings.max_chars_per_line,
                stats.lines_added()
            )),
        );
    }

    stats.elapsed = start_time.elapsed();
    (formatted, stats)
}

// ─────────────────────────────────────────────────────────────────────────────
// Backup
// ─────────────────────────────────────────────────────────────────────────────

/// Creates a backup of the file by appending the extension to the filename.
/// For example: "news.txt" with extension ".bak" becomes "news.txt.bak"
fn create_backup(path: &Path, ext: &str) -> Result<PathBuf> {
    let mut backup_name = path.as_os_str().to_owned();
    backup_name.push(ext);
    let backup_path = PathBuf::from(backup_name);

    fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to create backup at {}", backup_path.display()))?;

    Ok(backup_path)
}

/// Maximum file size (100 MB) - reject larger files to prevent memory issues
const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Text read from a file or stdin
#[derive(Debug)]
struct InputText {
    /// LF-only content without its final newline
    body: String,
    /// Whether writing `body` back would differ from the bytes read
    normalized: bool,
}

/// Read a text file
fn read_file(path: &Path) -> Result<InputText> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(ParseError(format!(
            "File too large: {} ({} MB). Maximum supported size is {} MB.",
            path.display(),
            metadata.len() / (1024 * 1024),
            MAX_FILE_SIZE / (1024 * 1024)
        ))
        .into());
    }

    let source_label = path.display().to_string();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;

    parse_bytes_to_text(bytes, &source_label)
}

/// Read text from stdin
fn read_stdin_content() -> Result<InputText> {
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .context("Failed to read stdin")?;
    parse_bytes_to_text(buf, "stdin")
}

/// Convert raw bytes to text, checking for binary content and valid UTF-8.
///
/// CRLF line endings become LF and a single trailing newline is dropped, so
/// the rules and the wrapper see the body only.
fn parse_bytes_to_text(bytes: Vec<u8>, source_label: &str) -> Result<InputText> {
    if bytes.contains(&0) {
        return Err(ParseError(format!("Input appears to be binary: {}", source_label)).into());
    }

    let content = String::from_utf8(bytes).map_err(|err| {
        let utf8_err = err.utf8_error();
        let valid_up_to = utf8_err.valid_up_to();
        let byte = err.as_bytes().get(valid_up_to).copied();
        let detail = match byte {
            Some(b) => format!(
                "Invalid UTF-8 at byte position {} (byte value: 0x{:02X}) in {}",
                valid_up_to, b, source_label
            ),
            None => format!("Invalid UTF-8 in {}", source_label),
        };
        ParseError(detail)
    })?;

    let unified = content.replace("\r\n", "\n");
    let body = match unified.strip_suffix('\n') {
        Some(body) => body.to_string(),
        None => unified,
    };
    let normalized = with_trailing_newline(&body) != content;
    Ok(InputText { body, normalized })
}

/// Text as written to disk: with a trailing newline unless empty
fn with_trailing_newline(text: &str) -> String {
    let mut output = text.to_string();
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Run a subcommand
fn run_command(command: &Commands, args: &Args) -> Result<()> {
    match command {
        Commands::Config { action } => run_config_command(action, args),
        Commands::Rules => list_rules(),
        Commands::Generate(generate) => run_generate(generate, args),
    }
}

/// Print the rule catalog
fn list_rules() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for rule in nlfmt::catalog() {
        let fixable = if rule.is_fixable() { "fix" } else { "   " };
        writeln!(stdout, "{:<24} {} {}", rule.id, fixable, rule.name)?;
        writeln!(stdout, "{:<24}     {}", "", rule.description)?;
    }
    Ok(())
}

/// Read an optional template part; missing parts are empty
fn read_optional(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => read_file(path).map(|input| input.body),
        None => Ok(String::new()),
    }
}

fn load_newsletter_data(path: &Path) -> Result<NewsletterData> {
    let content = read_file(path)?.body;
    serde_json::from_str(&content).map_err(|err| {
        ParseError(format!(
            "Failed to parse newsletter data {}: {}",
            path.display(),
            err
        ))
        .into()
    })
}

/// Assemble the newsletter and write it to stdout or --output
fn run_generate(generate: &GenerateArgs, args: &Args) -> Result<()> {
    validate_args(args)?;
    let config = create_config(args)?;
    let (console, styles) = build_console(config.color);

    let data = load_newsletter_data(&generate.data)?;
    let templates = Templates {
        newsletter: read_file(&generate.template)?.body,
        award_toc: read_optional(generate.award_toc.as_ref())?,
        award: read_optional(generate.award.as_ref())?,
    };
    let vars = TemplateVariables {
        chair: read_optional(generate.chair.as_ref())?,
        committee: read_optional(generate.committee.as_ref())?,
    };

    let settings = config.wrap.then_some(&config.settings);
    let newsletter = nlfmt::generate_newsletter(&data, &templates, &vars, settings)
        .with_context(|| format!("Failed to generate from {}", generate.template.display()))?;

    if config.verbose {
        console.print(
            &styles.header(format!(
                "Generated {} line(s) from {} report(s)",
                count_lines(&newsletter),
                data.reports.len()
            )),
        );
    }

    match &generate.output {
        Some(path) => {
            fs::write(path, with_trailing_newline(&newsletter))
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            if config.verbose {
                console.print(&styles.success(format!("Wrote {}", path.display())));
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", with_trailing_newline(&newsletter))?;
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

/// Result of processing a single file or stdin
struct FileResult {
    filename: String,
    original: String,
    formatted: String,
    stats: Stats,
    would_change: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::INVALID_ARGS,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Some(command) = &args.command {
        let exit_code = match run_command(command, &args) {
            Ok(()) => exit_codes::SUCCESS,
            Err(err) => {
                eprintln!("Error: {:#}", err);
                exit_code_for_error(&err)
            }
        };
        std::process::exit(exit_code);
    }

    let exit_code = match run(args) {
        Ok(outcome) => {
            if outcome.dry_run && outcome.would_change {
                exit_codes::WOULD_CHANGE
            } else {
                exit_codes::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_code_for_error(&err)
        }
    };

    std::process::exit(exit_code);
}

/// Process a single input (file or stdin) and return the result
fn process_input(
    input: InputText,
    filename: String,
    config: &Config,
    fix_rules: &[&'static TextRule],
    console: &Console,
    styles: &VerboseStyle,
) -> FileResult {
    if config.verbose {
        console.print(
            &styles.bold(format!(
                "Processing {} ({} lines)...",
                filename,
                count_lines(&input.body)
            )),
        );
    }

    let (formatted, stats) = format_text(&input.body, config, fix_rules, console, styles);
    let would_change = input.normalized || input.body != formatted;

    FileResult {
        filename,
        original: input.body,
        formatted,
        stats,
        would_change,
    }
}

/// Output a unified diff for a file result
fn output_diff(result: &FileResult, proposed: bool) -> Result<()> {
    if !result.would_change {
        return Ok(());
    }

    let diff = TextDiff::from_lines(&result.original, &result.formatted);
    let mut stdout = io::stdout().lock();

    writeln!(stdout, "--- a/{}", result.filename)?;
    if proposed {
        writeln!(stdout, "+++ b/{} (proposed)", result.filename)?;
    } else {
        writeln!(stdout, "+++ b/{}", result.filename)?;
    }

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        writeln!(stdout, "{}", hunk.header())?;
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            let line = change.value();
            if line.ends_with('\n') {
                write!(stdout, "{}{}", sign, line)?;
            } else {
                writeln!(stdout, "{}{}", sign, line)?;
            }
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Check Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Scan one input and print its issues. Returns whether anything was found.
fn check_input(
    text: &str,
    filename: &str,
    config: &Config,
    scan_rules: &[&'static TextRule],
    console: &Console,
    styles: &VerboseStyle,
) -> Result<(bool, Stats)> {
    let start_time = Instant::now();
    let issues = nlfmt::scan(text, scan_rules.iter().copied());
    let stats = Stats {
        lines_in: count_lines(text),
        lines_out: count_lines(text),
        issues_found: issues.iter().map(|issue| issue.count).sum(),
        elapsed: start_time.elapsed(),
        ..Stats::default()
    };

    if config.json {
        let json_output = JsonCheckOutput {
            version: "1.0",
            status: "check",
            file: filename.to_string(),
            issues: issues.iter().map(JsonIssue::from).collect(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&json_output).context("Failed to serialize JSON output")?
        );
    } else {
        let mut stdout = io::stdout().lock();
        for issue in &issues {
            writeln!(
                stdout,
                "{}: {} {} ({})",
                filename, issue.rule.id, issue.rule.name, issue.count
            )?;
        }
    }

    if config.verbose {
        if issues.is_empty() {
            console.print(&styles.success(format!("No issues: {}", filename)));
        } else {
            for issue in &issues {
                console.print(&styles.dim(format!("  {}", issue.rule.description)));
            }
        }
    }

    Ok((!issues.is_empty(), stats))
}

fn run_check(args: &Args, config: &Config, console: &Console, styles: &VerboseStyle) -> Result<RunOutcome> {
    let scan_rules = config.scan_rules()?;
    let mut any_issues = false;
    let mut aggregated_stats = Stats::default();
    let mut errors: Vec<(PathBuf, anyhow::Error)> = Vec::new();

    if args.inputs.is_empty() {
        let input = read_stdin_content()?;
        let (found, stats) = check_input(&input.body, "stdin", config, &scan_rules, console, styles)?;
        any_issues = found;
        aggregated_stats.merge(&stats);
    }

    for path in &args.inputs {
        match read_file(path) {
            Ok(input) => {
                let filename = path.display().to_string();
                let (found, stats) =
                    check_input(&input.body, &filename, config, &scan_rules, console, styles)?;
                any_issues |= found;
                aggregated_stats.merge(&stats);
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                errors.push((path.clone(), e));
            }
        }
    }

    if config.verbose {
        print_stats_summary(
            &aggregated_stats,
            args.inputs.len(),
            0,
            errors.len(),
            console,
            styles,
        );
    }

    report_errors(errors)?;

    Ok(RunOutcome {
        dry_run: true,
        would_change: any_issues,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Watch Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Watch a file for changes and re-format it on each save
fn watch_and_format(
    path: &Path,
    config: &Config,
    fix_rules: &[&'static TextRule],
    console: &Console,
    styles: &VerboseStyle,
) -> Result<RunOutcome> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!(
            "--watch requires a file, not a directory: {}",
            path.display()
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )
    .context("Failed to create file watcher")?;

    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch file: {}", path.display()))?;

    let debounce = Duration::from_millis(config.debounce_ms);
    let mut last_event = Instant::now() - debounce;

    eprintln!(
        "Watching {} for changes (Ctrl+C to stop)...",
        path.display()
    );

    let mut any_changes = false;

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    continue;
                }
                let now = Instant::now();
                if now.duration_since(last_event) < debounce {
                    continue;
                }
                last_event = now;

                match read_file(path) {
                    Ok(input) => {
                        let result = process_input(
                            input,
                            path.display().to_string(),
                            config,
                            fix_rules,
                            console,
                            styles,
                        );

                        if result.would_change {
                            match fs::write(path, with_trailing_newline(&result.formatted)) {
                                Ok(()) => {
                                    eprintln!(
                                        "✓ Formatted ({} fix(es), {} line(s) added)",
                                        result.stats.fixes_applied,
                                        result.stats.lines_added()
                                    );
                                    any_changes = true;
                                }
                                Err(e) => {
                                    eprintln!("✗ Failed to write: {}", e);
                                }
                            }
                        } else {
                            eprintln!("✓ No changes needed");
                        }
                    }
                    Err(e) => {
                        eprintln!("✗ Error reading file: {}", e);
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    eprintln!("\nWatch mode stopped.");

    Ok(RunOutcome {
        dry_run: false,
        would_change: any_changes,
    })
}

fn run(args: Args) -> Result<RunOutcome> {
    validate_args(&args)?;

    let config = create_config(&args)?;
    let (console, styles) = build_console(config.color);

    if config.check {
        return run_check(&args, &config, &console, &styles);
    }

    let fix_rules = config.fix_rules()?;

    if config.verbose && !fix_rules.is_empty() {
        let ids: Vec<&str> = fix_rules.iter().map(|rule| rule.id).collect();
        console.print(
            &styles.dim(format!("Fixing: {}", ids.join(", "))),
        );
    }

    if config.watch {
        return watch_and_format(&args.inputs[0], &config, &fix_rules, &console, &styles);
    }

    if args.inputs.is_empty() {
        let input = read_stdin_content()?;
        let result = process_input(
            input,
            "stdin".to_string(),
            &config,
            &fix_rules,
            &console,
            &styles,
        );
        output_single_result(&args, &config, &console, &styles, result)
    } else if args.inputs.len() == 1 {
        let path = &args.inputs[0];
        let input = read_file(path)?;
        let result = process_input(
            input,
            path.display().to_string(),
            &config,
            &fix_rules,
            &console,
            &styles,
        );
        output_single_result(&args, &config, &console, &styles, result)
    } else {
        output_multiple_results(&args, &config, &fix_rules, &console, &styles)
    }
}

/// Write a formatted result back to its file, with optional backup
fn write_in_place(
    path: &Path,
    result: &FileResult,
    config: &Config,
    console: &Console,
    styles: &VerboseStyle,
) -> Result<()> {
    if config.backup {
        let backup_path = create_backup(path, &config.backup_ext)?;
        if config.verbose {
            console.print(
                &styles.dim(format!("Created backup: {}", backup_path.display())),
            );
        }
    }

    fs::write(path, with_trailing_newline(&result.formatted))
        .with_context(|| format!("Failed to write to file: {}", path.display()))
}

/// Handle output for a single file/stdin result
fn output_single_result(
    args: &Args,
    config: &Config,
    console: &Console,
    styles: &VerboseStyle,
    result: FileResult,
) -> Result<RunOutcome> {
    let would_change = result.would_change;

    if config.json {
        output_json_single(args, config, &result)?;
    } else if config.dry_run {
        output_dry_run_single(config, console, styles, &result)?;
    } else if config.diff {
        output_diff(&result, false)?;
    } else if args.in_place {
        let path = args
            .inputs
            .first()
            .ok_or_else(|| ArgError("--in-place requires an input file".to_string()))?;
        write_in_place(path, &result, config, console, styles)?;
    } else {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", with_trailing_newline(&result.formatted))?;
    }

    if config.verbose {
        print_stats_summary(
            &result.stats,
            1,
            usize::from(would_change),
            0,
            console,
            styles,
        );
    }

    Ok(RunOutcome {
        dry_run: config.dry_run,
        would_change,
    })
}

/// Output JSON for a single file result
fn output_json_single(args: &Args, config: &Config, result: &FileResult) -> Result<()> {
    let json_output = JsonOutput {
        version: "1.0",
        status: if config.dry_run {
            "dry_run".to_string()
        } else {
            "success".to_string()
        },
        file: Some(result.filename.clone()),
        input: InputStats {
            lines: result.stats.lines_in,
            bytes: result.original.len(),
        },
        processing: ProcessingStats {
            fixes_applied: result.stats.fixes_applied,
            lines_added: result.stats.lines_added(),
            wrapped: config.wrap,
        },
        output: Some(OutputStats {
            lines: result.stats.lines_out,
            bytes: result.formatted.len(),
            changed: result.would_change,
        }),
        content: if !config.dry_run && !args.in_place {
            Some(result.formatted.clone())
        } else {
            None
        },
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&json_output).context("Failed to serialize JSON output")?
    );

    if args.in_place && !config.dry_run {
        let path = Path::new(&result.filename);
        if config.backup {
            create_backup(path, &config.backup_ext)?;
        }
        fs::write(path, with_trailing_newline(&result.formatted))
            .with_context(|| format!("Failed to write to file: {}", path.display()))?;
    }

    Ok(())
}

/// Output dry-run info for a single file
fn output_dry_run_single(
    config: &Config,
    console: &Console,
    styles: &VerboseStyle,
    result: &FileResult,
) -> Result<()> {
    if config.diff && result.would_change {
        output_diff(result, true)?;
    }

    if config.verbose {
        if result.would_change {
            console.print(
                &styles.rule(format!("Would modify: {}", result.filename)),
            );
            console.print(
                &styles.dim(format!(
                    "  {} fix(es), {} line(s) added",
                    result.stats.fixes_applied,
                    result.stats.lines_added()
                )),
            );
        } else {
            console.print(
                &styles.success(format!("No changes needed: {}", result.filename)),
            );
        }
    }

    Ok(())
}

/// Turn per-file errors into one error for the exit code
fn report_errors(errors: Vec<(PathBuf, anyhow::Error)>) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }

    let files = errors
        .iter()
        .map(|(p, _)| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let has_parse_error = errors
        .iter()
        .any(|(_, err)| error_chain_has::<ParseError>(err));

    if has_parse_error {
        return Err(ParseError(format!(
            "{} file(s) had parse errors: {}",
            errors.len(),
            files
        ))
        .into());
    }

    anyhow::bail!("{} file(s) had errors: {}", errors.len(), files);
}

/// Handle output for multiple files
fn output_multiple_results(
    args: &Args,
    config: &Config,
    fix_rules: &[&'static TextRule],
    console: &Console,
    styles: &VerboseStyle,
) -> Result<RunOutcome> {
    let mut total_files_processed = 0;
    let mut total_files_changed = 0;
    let mut aggregated_stats = Stats::default();
    let mut any_would_change = false;
    let mut errors: Vec<(PathBuf, anyhow::Error)> = Vec::new();

    let show_file_headers = !args.in_place && !config.diff && !config.json;

    for path in &args.inputs {
        let input = match read_file(path) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                errors.push((path.clone(), e));
                continue;
            }
        };

        let result = process_input(
            input,
            path.display().to_string(),
            config,
            fix_rules,
            console,
            styles,
        );

        if result.would_change {
            any_would_change = true;
            total_files_changed += 1;
        }
        total_files_processed += 1;
        aggregated_stats.merge(&result.stats);

        if config.json {
            output_json_single(args, config, &result)?;
        } else if config.dry_run {
            output_dry_run_single(config, console, styles, &result)?;
        } else if config.diff {
            output_diff(&result, false)?;
        } else if args.in_place {
            write_in_place(path, &result, config, console, styles)?;

            if config.verbose {
                if result.would_change {
                    console.print(
                        &styles.success(format!(
                            "{}: {} fix(es), {} line(s) added",
                            path.display(),
                            result.stats.fixes_applied,
                            result.stats.lines_added()
                        )),
                    );
                } else {
                    console.print(&styles.dim(format!("{}: No changes needed", path.display())));
                }
            }
        } else {
            let mut stdout = io::stdout().lock();

            if show_file_headers {
                writeln!(stdout, "==> {} <==", path.display())?;
            }

            write!(stdout, "{}", with_trailing_newline(&result.formatted))?;

            if show_file_headers {
                writeln!(stdout)?;
            }
        }
    }

    if config.verbose {
        print_stats_summary(
            &aggregated_stats,
            total_files_processed,
            total_files_changed,
            errors.len(),
            console,
            styles,
        );
    }

    report_errors(errors)?;

    Ok(RunOutcome {
        dry_run: config.dry_run,
        would_change: any_would_change,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
