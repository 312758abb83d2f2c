//! auslex CLI: encode, compare and validate legal extractions; plan with the
//! active inference agent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use auslex::agent::{ActiveInferenceAgent, GenerativeModel, ModelSpec, Phase, SimulatedEnvironment};
use auslex::config::AuslexConfig;
use auslex::extract::Extraction;
use auslex::ontology::{Ontology, SymbolTable};
use auslex::reason::{AnalogyEngine, ContradictionDetector, PartialSituation, Validator};
use auslex::symbol::SymbolKind;
use auslex::vsa::encode::{EncodedSituation, SituationEncoder};

#[derive(Parser)]
#[command(name = "auslex", version, about = "Neuro-symbolic legal reasoning core")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hypervector dimension (overrides the configuration).
    #[arg(long, global = true)]
    dimension: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an extraction file and summarise the result.
    Encode {
        /// Extraction JSON.
        input: PathBuf,

        /// Write the full encoding (vectors included) as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare two extractions: consistent, contradictory or unrelated.
    Compare { a: PathBuf, b: PathBuf },

    /// Validate claim extractions against evidence extractions.
    Validate {
        #[arg(long, num_args = 1.., required = true)]
        claims: Vec<PathBuf>,

        #[arg(long, num_args = 1..)]
        evidence: Vec<PathBuf>,
    },

    /// Propose fillers for open roles by analogy with a source extraction.
    Analogy {
        /// Source extraction JSON.
        source: PathBuf,

        /// Known role/filler pairs of the target, as `role=filler`.
        #[arg(long = "bind", value_parser = parse_binding)]
        bound: Vec<(String, String)>,

        /// Roles whose fillers are wanted.
        #[arg(long = "ask", required = true)]
        unbound: Vec<String>,
    },

    /// Run the active inference agent on a generative model.
    Plan {
        /// Model file (TOML, or JSON by extension).
        model: PathBuf,

        /// Observations to feed, comma-separated. Without them the agent runs
        /// against an environment simulated from the model.
        #[arg(long, value_delimiter = ',')]
        observations: Vec<usize>,

        /// Seed of the simulated environment.
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Inspect the ontology.
    Ontology {
        #[command(subcommand)]
        action: OntologyAction,
    },
}

#[derive(Subcommand)]
enum OntologyAction {
    /// List symbols.
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Export the symbol table (bincode) for a persistence layer.
    Export {
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Concept,
    Role,
    Marker,
}

impl From<KindArg> for SymbolKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Concept => SymbolKind::Concept,
            KindArg::Role => SymbolKind::Role,
            KindArg::Marker => SymbolKind::Marker,
        }
    }
}

fn parse_binding(s: &str) -> std::result::Result<(String, String), String> {
    let (role, filler) = s
        .split_once('=')
        .ok_or_else(|| format!("expected role=filler, got \"{s}\""))?;
    Ok((role.trim().to_string(), filler.trim().to_string()))
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AuslexConfig::load(path)?,
        None => AuslexConfig::default(),
    };
    if let Some(dimension) = cli.dimension {
        config.vsa.dimension = dimension;
        config.validate()?;
    }

    match cli.command {
        Commands::Encode { input, output } => {
            let ontology = config.ontology()?;
            let encoded = encode_file(&ontology, &input)?;
            println!("chunk: {}", encoded.chunk_id);
            println!("structures: {}", encoded.structures.len());
            for structure in &encoded.structures {
                let negated = if structure.negated { " (negated)" } else { "" };
                println!("  {}{negated}", structure.key);
            }
            println!("symbols: {}", encoded.symbols.len());
            for warning in &encoded.warnings {
                println!("warning: {warning}");
            }
            if let Some(path) = output {
                let json = serde_json::to_string(&encoded).into_diagnostic()?;
                std::fs::write(&path, json).into_diagnostic()?;
                println!("wrote {}", path.display());
            }
        }

        Commands::Compare { a, b } => {
            let ontology = config.ontology()?;
            let detector = ContradictionDetector::new(&ontology, config.contradiction)?;
            let a = encode_file(&ontology, &a)?;
            let b = encode_file(&ontology, &b)?;
            let comparison = detector.compare_situations(&a, &b)?;
            print_json(&comparison)?;
        }

        Commands::Validate { claims, evidence } => {
            let ontology = config.ontology()?;
            let detector = ContradictionDetector::new(&ontology, config.contradiction)?;
            let claims = encode_files(&ontology, &claims)?;
            let evidence = encode_files(&ontology, &evidence)?;
            let report = Validator::new(&detector, config.validator).validate(&claims, &evidence)?;
            print_json(&report)?;
            if !report.passed {
                std::process::exit(1);
            }
        }

        Commands::Analogy {
            source,
            bound,
            unbound,
        } => {
            let ontology = config.ontology()?;
            let source = encode_file(&ontology, &source)?;
            let target = PartialSituation { bound, unbound };
            let candidates = AnalogyEngine::new(&ontology, config.analogy).complete(&source, &target)?;
            if candidates.is_empty() {
                println!("no candidates above {}", config.analogy.min_similarity);
            }
            for c in &candidates {
                println!("{} = {}  ({:.4}, via {})", c.role, c.filler, c.similarity, c.anchor);
            }
        }

        Commands::Plan {
            model,
            observations,
            seed,
        } => {
            let model = Arc::new(GenerativeModel::new(ModelSpec::load(&model)?)?);
            let mut agent = ActiveInferenceAgent::new(model.clone(), config.agent.clone())?;
            if observations.is_empty() {
                let mut env = SimulatedEnvironment::new(model, seed)?;
                let first = env.observe()?;
                let summary = agent.run_episode(&mut env, first)?;
                print_json(&summary)?;
            } else {
                for obs in observations {
                    let outcome = agent.step(obs)?;
                    print_json(&outcome)?;
                    if outcome.action.is_none() || agent.phase() == Phase::Terminal {
                        break;
                    }
                }
            }
        }

        Commands::Ontology { action } => {
            let ontology = config.ontology()?;
            match action {
                OntologyAction::List { kind } => {
                    let kind = kind.map(SymbolKind::from);
                    for meta in ontology.symbols() {
                        if kind.is_none_or(|k| k == meta.kind) {
                            println!("{:>5}  {:<8} {}", meta.id, meta.kind, meta.name);
                        }
                    }
                }
                OntologyAction::Export { output } => {
                    let table: SymbolTable = ontology.snapshot();
                    let bytes = table.to_bytes()?;
                    std::fs::write(&output, bytes).into_diagnostic()?;
                    println!(
                        "exported {} symbols (dim {}) to {}",
                        table.symbols.len(),
                        table.dimension,
                        output.display()
                    );
                }
            }
        }
    }

    Ok(())
}

fn read_extraction(path: &Path) -> Result<Extraction> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    let mut extraction = Extraction::from_json(&content);
    if extraction.chunk_id.is_empty() {
        extraction.chunk_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(extraction)
}

fn encode_file(ontology: &Ontology, path: &Path) -> Result<EncodedSituation> {
    Ok(SituationEncoder::new(ontology).encode(&read_extraction(path)?))
}

fn encode_files(ontology: &Ontology, paths: &[PathBuf]) -> Result<Vec<EncodedSituation>> {
    paths.iter().map(|p| encode_file(ontology, p)).collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
