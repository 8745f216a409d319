use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use track_core::{ChangeEditor, PluginRegistry, TrackerConfig};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const READ_CHUNK: usize = 64 * 1024;
const OUTLINE_CAP: usize = 10_000;

/// Review tracked insertions and deletions in HTML fragments
#[derive(Parser)]
#[command(name = "redline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Tracker configuration (TOML, or JSON when the file ends in .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Accept every change and print the result
    AcceptAll { input: Option<PathBuf> },
    /// Reject every change and print the result
    RejectAll { input: Option<PathBuf> },
    /// Print the markup with every change accepted, leaving the input untouched
    Clean { input: Option<PathBuf> },
    /// Replace delete regions with placeholder elements
    Placehold { input: Option<PathBuf> },
    /// List logical changes as JSON
    Changes {
        input: Option<PathBuf>,
        /// Pretty-print the listing
        #[arg(long)]
        pretty: bool,
    },
    /// Print the node tree with change attributes highlighted
    Outline { input: Option<PathBuf> },
}

impl Command {
    fn input(&self) -> Option<&Path> {
        match self {
            Command::AcceptAll { input }
            | Command::RejectAll { input }
            | Command::Clean { input }
            | Command::Placehold { input }
            | Command::Changes { input, .. }
            | Command::Outline { input } => input.as_deref(),
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn load_config(path: Option<&Path>) -> Result<TrackerConfig> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        TrackerConfig::from_json(&text)?
    } else {
        let config: TrackerConfig =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        config
    };
    log::debug!(target: "redline", "loaded config from {}", path.display());
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            let mut file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            tools::utf8::read_utf8_lossy(&mut file, READ_CHUNK)
                .with_context(|| format!("reading {}", path.display()))
        }
        None => tools::utf8::read_utf8_lossy(&mut io::stdin().lock(), READ_CHUNK)
            .context("reading stdin"),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let source = read_input(cli.command.input())?;
    let highlight = config.change_id_attribute.clone();
    let mut editor = ChangeEditor::from_html(&source, config, &PluginRegistry::with_builtins())
        .context("starting the change tracker")?;

    let mut out = io::stdout().lock();
    match &cli.command {
        Command::AcceptAll { .. } => {
            if !editor.accept_all() {
                bail!("accepting changes failed");
            }
            writeln!(out, "{}", editor.html())?;
        }
        Command::RejectAll { .. } => {
            if !editor.reject_all() {
                bail!("rejecting changes failed");
            }
            writeln!(out, "{}", editor.html())?;
        }
        Command::Clean { .. } => {
            writeln!(out, "{}", editor.get_clean_content(None)?)?;
        }
        Command::Placehold { .. } => {
            let count = editor.placehold_deletes();
            log::info!(target: "redline", "placeheld {count} delete regions");
            writeln!(out, "{}", editor.html())?;
        }
        Command::Changes { pretty, .. } => {
            let changes = editor.list_changes();
            let json = if *pretty {
                serde_json::to_string_pretty(&changes)?
            } else {
                serde_json::to_string(&changes)?
            };
            writeln!(out, "{json}")?;
        }
        Command::Outline { .. } => {
            let doc = editor.document();
            for line in html::outline::outline(doc, editor.root(), &[highlight.as_str()], OUTLINE_CAP) {
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()?;
    editor.unload_plugins();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}
