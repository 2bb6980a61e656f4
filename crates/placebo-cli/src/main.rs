use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use placebo_callgraph::{CallGraphBackend, DirectEdges, GxlWriter, HierarchyEdges};
use placebo_config::{init_tracing, PlaceboConfig};
use placebo_model::Program;
use placebo_reflect::ReflectionFacts;
use placebo_synth::{
    synthesize_program, Abstraction, AbstractionKind, PerUnitSet, SynthesisReport, Synthesizer,
};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "placebo",
    version,
    about = "Placeholder bodies for Java library methods"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Config file (defaults to `placebo.toml` in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Replace every library method body of a program model with a placeholder
    Synth(SynthArgs),
    /// Build a call graph for a benchmark and write it as GXL
    Callgraph(CallgraphArgs),
}

#[derive(Args)]
struct SynthArgs {
    /// Program model (JSON)
    program: PathBuf,
    /// Reflection log to fold into the placeholders
    #[arg(long)]
    facts: Option<PathBuf>,
    /// Abstraction strategy: `shared` or `per-unit`
    #[arg(long)]
    abstraction: Option<AbstractionKind>,
    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,
    /// Where to write the rewritten model
    #[arg(long)]
    out: Option<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CallgraphArgs {
    /// Directory holding `<benchmark>.json` and optionally `<benchmark>.refl.log`
    home: PathBuf,
    /// Benchmark name
    benchmark: String,
    /// Replace library bodies with placeholders before building the graph
    #[arg(long)]
    placeholder: bool,
    #[arg(long, value_enum, default_value_t = Backend::Direct)]
    backend: Backend,
    /// Output directory for the GXL file
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Direct,
    Hierarchy,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let config = PlaceboConfig::discover(cli.config.as_deref(), &cwd)?;
    init_tracing(&config.logging);

    match cli.command {
        Command::Synth(args) => synth(args, config),
        Command::Callgraph(args) => callgraph(args, config),
    }
}

#[derive(Serialize)]
struct SynthSummary {
    output: PathBuf,
    abstraction: AbstractionKind,
    #[serde(flatten)]
    report: SynthesisReport,
    /// Types stored into the shared set; empty for `per-unit`.
    flow_types: Vec<String>,
}

fn synth(args: SynthArgs, mut config: PlaceboConfig) -> Result<i32> {
    if let Some(kind) = args.abstraction {
        config.synthesis.abstraction = kind;
    }
    if args.threads.is_some() {
        config.synthesis.threads = args.threads;
    }
    let facts_path = args.facts.or_else(|| config.reflection.facts_file.clone());
    let facts = match facts_path {
        Some(path) => ReflectionFacts::load(&path)?,
        None => ReflectionFacts::empty(),
    };

    let mut program = Program::load_json(&args.program)?;
    let (report, flow_types) = replace_library_bodies(&mut program, &config, facts);

    let output = match args.out {
        Some(out) => out,
        None => {
            let stem = args
                .program
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "program".to_owned());
            config.output.dir.join(format!("{stem}.json"))
        }
    };
    ensure_parent(&output)?;
    program.write_json(&output)?;

    let summary = SynthSummary {
        output,
        abstraction: config.synthesis.abstraction,
        report,
        flow_types,
    };
    print_summary(&summary, args.json)?;
    Ok(0)
}

/// Runs the batch with the configured strategy. Returns the report and the
/// shared set's flow types, rendered.
fn replace_library_bodies(
    program: &mut Program,
    config: &PlaceboConfig,
    facts: ReflectionFacts,
) -> (SynthesisReport, Vec<String>) {
    let shared = config.synthesis.shared_set();
    let abstraction: &dyn Abstraction = match config.synthesis.abstraction {
        AbstractionKind::Shared => &shared,
        AbstractionKind::PerUnit => &PerUnitSet,
    };
    let synthesizer = Synthesizer::new(abstraction)
        .with_reflection(facts)
        .with_options(config.synthesis.options());
    let report = synthesize_program(program, &synthesizer);

    let flow_types = match config.synthesis.abstraction {
        AbstractionKind::Shared => shared.flow_types().iter().map(ToString::to_string).collect(),
        AbstractionKind::PerUnit => Vec::new(),
    };
    (report, flow_types)
}

fn callgraph(args: CallgraphArgs, config: PlaceboConfig) -> Result<i32> {
    let started = Instant::now();

    let model_path = args.home.join(format!("{}.json", args.benchmark));
    let mut program = Program::load_json(&model_path)?;

    if args.placeholder {
        let facts_path = args.home.join(format!("{}.refl.log", args.benchmark));
        let facts = if facts_path.is_file() {
            ReflectionFacts::load(&facts_path)?
        } else {
            ReflectionFacts::empty()
        };
        let (report, _) = replace_library_bodies(&mut program, &config, facts);
        if !report.is_clean() {
            eprintln!(
                "warning: {} library method(s) kept their original body",
                report.skipped.len()
            );
        }
    }

    let backend: &dyn CallGraphBackend = match args.backend {
        Backend::Direct => &DirectEdges,
        Backend::Hierarchy => &HierarchyEdges,
    };
    let graph = backend.build(&program);
    tracing::info!(
        target: "placebo.callgraph",
        backend = backend.name(),
        nodes = graph.nodes.len(),
        edges = graph.size(),
        "call graph built"
    );

    let out_dir = args.out.unwrap_or(config.output.dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let gxl_path = out_dir.join(format!("{}.gxl", args.benchmark));
    let file = File::create(&gxl_path)
        .with_context(|| format!("failed to create {}", gxl_path.display()))?;
    GxlWriter::new(args.benchmark.as_str())
        .write(&graph, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", gxl_path.display()))?;

    println!(
        "Total time to finish: {:.3}",
        started.elapsed().as_secs_f64()
    );
    println!("=====================================================");
    println!("# edges = {}", graph.size());
    println!("=====================================================");
    Ok(0)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display())),
        _ => Ok(()),
    }
}

fn print_summary(summary: &SynthSummary, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(summary)?;
        println!("{out}");
        return Ok(());
    }

    let report = &summary.report;
    println!("wrote: {}", summary.output.display());
    println!("  abstraction: {}", summary.abstraction);
    println!("  synthesized: {}", report.synthesized);
    println!("  skipped: {}", report.skipped.len());
    println!("  methods_reading_arrays: {}", report.methods_reading_arrays);
    println!("  methods_writing_arrays: {}", report.methods_writing_arrays);
    if !summary.flow_types.is_empty() {
        println!("  flow_types: {}", summary.flow_types.join(", "));
    }
    for skipped in &report.skipped {
        println!("skipped {}: {}", skipped.method, skipped.error);
    }
    Ok(())
}
