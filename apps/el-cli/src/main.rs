use clap::{Parser, Subcommand, ValueEnum};
use el_edit::{ConstraintRegistry, EditError, EditOp};
use el_model::{EngineSpec, FieldPath, PatchValue, presets};
use el_session::{EditSession, SessionError, SessionEvent, SessionOptions};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "el-cli")]
#[command(about = "EngineLab CLI - guarded edits of an engine description", long_about = None)]
struct Cli {
    /// Engine description to start from
    #[arg(long, value_enum, default_value_t = Preset::Minimal, global = true)]
    preset: Preset,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List writable fields with their current value and constraint
    Fields {
        /// Only show fields in this group (e.g. valvetrain, limits)
        #[arg(long)]
        group: Option<String>,
    },
    /// Show what the constraint registry does to one value
    Clamp {
        /// Dotted field path, e.g. Cam.IntakeDuration_deg050
        path: String,
        /// Requested value
        value: String,
    },
    /// Run one edit batch through a session and print the settled result
    Edit {
        /// Edits as PATH=VALUE; repeat for a batch
        #[arg(long = "set", value_name = "PATH=VALUE", required = true)]
        edits: Vec<EditOp>,
        /// Quiet period before the snapshot counts as settled
        #[arg(long, default_value_t = 120)]
        debounce_ms: u64,
        /// Also print the settled snapshot
        #[arg(long, value_enum)]
        dump: Option<DumpFormat>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Direct compression ratio, no chamber geometry
    Minimal,
    /// Compression ratio derived from chamber geometry
    Chamber,
}

impl Preset {
    fn spec(self) -> EngineSpec {
        match self {
            Preset::Minimal => presets::b6_minimal(),
            Preset::Chamber => presets::b6_with_chamber(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Json,
    Yaml,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Session did not settle within {0:?}")]
    NotSettled(Duration),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let spec = cli.preset.spec();

    match cli.command {
        Commands::Fields { group } => cmd_fields(&spec, group.as_deref()),
        Commands::Clamp { path, value } => cmd_clamp(&spec, &path, &value),
        Commands::Edit {
            edits,
            debounce_ms,
            dump,
        } => cmd_edit(spec, edits, Duration::from_millis(debounce_ms), dump),
    }
}

fn cmd_fields(spec: &EngineSpec, group: Option<&str>) -> CliResult<()> {
    let registry = ConstraintRegistry::standard();
    println!("Fields of {}:", spec.name);
    for &path in FieldPath::ALL {
        if group.is_some_and(|g| !path.group().eq_ignore_ascii_case(g)) {
            continue;
        }
        let c = registry.effective(path, spec);
        let bounds = if c.registered {
            format!(
                "[{} .. {}] step {}",
                fmt_bound(c.min),
                fmt_bound(c.max),
                c.step
            )
        } else {
            "unconstrained".to_string()
        };
        let enabled = if c.enabled { "" } else { " (disabled)" };
        println!(
            "  {:<30} {:<12} {:<28} = {:<14} {}{}",
            path.as_str(),
            path.group(),
            path.kind().describe(),
            path.read(spec).to_string(),
            bounds,
            enabled
        );
        if let Some(names) = path.enum_names() {
            println!("  {:<30} one of {}", "", names.join(", "));
        }
    }
    Ok(())
}

fn fmt_bound(bound: Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}

fn cmd_clamp(spec: &EngineSpec, path: &str, value: &str) -> CliResult<()> {
    let field = EditOp::new(path, PatchValue::parse_loose(value)).resolve()?;
    let outcome = ConstraintRegistry::standard().clamp(field.path, &field.value, spec);
    println!("{} requested {}", field.path, field.value);
    match outcome.note {
        Some(note) if outcome.is_disabled() => println!("  ignored: {note}"),
        Some(note) => println!("  -> {} ({note})", outcome.value),
        None => println!("  -> {} (unchanged)", outcome.value),
    }
    Ok(())
}

fn cmd_edit(
    spec: EngineSpec,
    edits: Vec<EditOp>,
    debounce: Duration,
    dump: Option<DumpFormat>,
) -> CliResult<()> {
    let session =
        EditSession::with_options(spec, SessionOptions::default().with_debounce(debounce));
    let events = session.subscribe();

    debug!(edits = edits.len(), "submitting edit batch");
    let outcome = session.set_many(edits)?;
    for guard in &outcome.guardrails {
        println!("⚠ {}", guard.message());
    }
    if let Some(cr) = outcome.compression_ratio {
        println!("Derived compression ratio: {cr:.3}");
    }

    let wait = debounce * 10 + Duration::from_secs(1);
    let settled = loop {
        match events.recv_timeout(wait) {
            Ok(SessionEvent::SpecChanged(spec)) => break spec,
            Ok(SessionEvent::GuardRail(_)) => continue,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                return Err(CliError::NotSettled(wait));
            }
        }
    };

    let changes = session.diff();
    if changes.is_empty() {
        println!("No fields changed");
    } else {
        println!("Changed fields:");
        for change in &changes {
            println!("  {:<30} {} -> {}", change.path.as_str(), change.before, change.after);
        }
    }

    match dump {
        Some(DumpFormat::Json) => println!("{}", serde_json::to_string_pretty(&*settled)?),
        Some(DumpFormat::Yaml) => print!("{}", serde_yaml::to_string(&*settled)?),
        None => {}
    }
    Ok(())
}
