//! Tracekit CLI - Command-line interface for the signal fusion engine
//!
//! Commands:
//! - fingerprint: Run a full pass over a component-bag JSON file
//! - confidence: Score a component bag without synthesizing a digest
//! - behavior: Replay an interaction-event window and print its features
//! - schema: Print the well-known component keys and reserved-key contract

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracekit::behavior::{BehaviorCollector, InteractionEvent, InteractionSource};
use tracekit::schema;
use tracekit::{EngineError, EnvironmentMarkers, FingerprintEngine, TRACEKIT_VERSION};

/// Tracekit - On-device signal fusion engine for client fingerprinting
#[derive(Parser)]
#[command(name = "tracekit")]
#[command(version = TRACEKIT_VERSION)]
#[command(about = "Fuse client signals into a confidence score and digest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full fingerprinting pass over a component bag
    Fingerprint {
        /// Component bag JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// User-agent string for context classification
        #[arg(long)]
        user_agent: Option<String>,

        /// Treat the host bridge object as present
        #[arg(long)]
        bridge: bool,

        /// Host application version reported by the embedder
        #[arg(long)]
        host_version: Option<String>,

        /// Interaction-event JSON array to replay as the behavioral window
        #[arg(long)]
        events: Option<PathBuf>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Score confidence for a component bag
    Confidence {
        /// Component bag JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// User-agent string for context classification
        #[arg(long)]
        user_agent: Option<String>,

        /// Treat the host bridge object as present
        #[arg(long)]
        bridge: bool,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Replay an interaction-event window and print its feature summary
    Behavior {
        /// Interaction-event JSON array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Collection window duration in milliseconds
        #[arg(long, default_value = "3000")]
        window_ms: f64,

        /// Pretty-print the summary
        #[arg(long)]
        pretty: bool,
    },

    /// Print the inbound component-bag contract
    Schema,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Refusing to read JSON from an interactive terminal (pass a file or pipe input)")]
    InteractiveStdin,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Fingerprint {
            input,
            user_agent,
            bridge,
            host_version,
            events,
            pretty,
        } => cmd_fingerprint(
            &input,
            user_agent,
            bridge,
            host_version,
            events.as_deref(),
            pretty,
        ),

        Commands::Confidence {
            input,
            user_agent,
            bridge,
            pretty,
        } => cmd_confidence(&input, user_agent, bridge, pretty),

        Commands::Behavior {
            input,
            window_ms,
            pretty,
        } => cmd_behavior(&input, window_ms, pretty),

        Commands::Schema => cmd_schema(),
    }
}

fn cmd_fingerprint(
    input: &Path,
    user_agent: Option<String>,
    bridge: bool,
    host_version: Option<String>,
    events: Option<&Path>,
    pretty: bool,
) -> Result<(), CliError> {
    let components = tracekit::parse_components(&read_input(input)?)?;
    let markers = build_markers(&components, user_agent, bridge, host_version);

    let mut engine = FingerprintEngine::new();
    let report = match events {
        Some(path) => {
            let mut source = ReplaySource::new(parse_events(&read_input(path)?)?);
            engine.fingerprint_with_behavior(&components, &markers, &mut source)
        }
        None => engine.fingerprint(&components, &markers),
    };

    print_json(&report, pretty)
}

fn cmd_confidence(
    input: &Path,
    user_agent: Option<String>,
    bridge: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let components = tracekit::parse_components(&read_input(input)?)?;
    let markers = build_markers(&components, user_agent, bridge, None);

    let result = FingerprintEngine::new().confidence(&components, &markers);
    print_json(&result, pretty)
}

fn cmd_behavior(input: &Path, window_ms: f64, pretty: bool) -> Result<(), CliError> {
    let mut source = ReplaySource::new(parse_events(&read_input(input)?)?);
    let mut collector = BehaviorCollector::with_window_ms(window_ms);
    let summary = collector.collect(&mut source);
    print_json(&summary, pretty)
}

fn cmd_schema() -> Result<(), CliError> {
    let contract = serde_json::json!({
        "knownKeys": schema::known_keys(),
        "reservedPrefix": schema::RESERVED_PREFIX.to_string(),
        "metaKey": schema::META_KEY,
    });
    print_json(&contract, true)
}

/// Markers from the bag itself, overridden by explicit CLI flags.
fn build_markers(
    components: &tracekit::ComponentBag,
    user_agent: Option<String>,
    bridge: bool,
    host_version: Option<String>,
) -> EnvironmentMarkers {
    let mut markers = EnvironmentMarkers::from_components(components);
    if let Some(ua) = user_agent {
        markers.user_agent = ua;
    }
    if bridge {
        markers.has_bridge_object = true;
    }
    if host_version.is_some() {
        markers.host_version = host_version;
    }
    markers
}

fn read_input(path: &Path) -> Result<String, CliError> {
    if path.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(CliError::InteractiveStdin);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_events(json: &str) -> Result<Vec<InteractionEvent>, CliError> {
    serde_json::from_str(json)
        .map_err(|e| EngineError::InvalidEvents(format!("Failed to parse event array: {e}")))
        .map_err(CliError::from)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(EngineError::JsonError)?;
    println!("{rendered}");
    Ok(())
}

/// Replays a recorded event array through the collector as one window.
struct ReplaySource {
    events: Vec<InteractionEvent>,
    cursor: usize,
}

impl ReplaySource {
    fn new(events: Vec<InteractionEvent>) -> Self {
        Self { events, cursor: 0 }
    }
}

impl InteractionSource for ReplaySource {
    fn subscribe(&mut self) {}

    fn unsubscribe(&mut self) {}

    fn next_event(&mut self, deadline_ms: f64) -> Option<InteractionEvent> {
        let event = self.events.get(self.cursor)?;
        if event.timestamp_ms > deadline_ms {
            return None;
        }
        self.cursor += 1;
        Some(event.clone())
    }

    fn now_ms(&mut self) -> f64 {
        // Anchor the window at the recording's first timestamp.
        self.events.first().map(|e| e.timestamp_ms).unwrap_or(0.0)
    }
}
