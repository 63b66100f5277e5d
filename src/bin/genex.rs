use clap::{Parser, Subcommand};
use genex::{
    analyzer,
    ast::EvaluatorNode,
    config::EngineConfig,
    engine::{Engine, Evaluation},
    expression::{preprocess, split, PreprocessMode},
    model::{BuildModel, InMemoryModel, ProjectSpec, TargetId},
    tokenizer, Error, GenexResult,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an engine config file (JSON)
    #[arg(short, long, global = true)]
    engine_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression
    Eval(EvalArgs),

    /// Evaluate a target's own property, including transitive requirements
    Property(PropertyArgs),

    /// Dump the token stream of an expression
    Tokens { expression: String },

    /// Dump the evaluator tree of an expression
    Tree { expression: String },

    /// Strip or select generator expressions for export
    Preprocess(PreprocessArgs),

    /// Split a list, keeping generator expressions intact
    Split { input: String },
}

#[derive(Parser)]
struct ProjectArgs {
    /// Path to a project description (JSON)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Build configuration
    #[arg(short, long, default_value = "")]
    config: String,

    /// Print a JSON report instead of the plain result
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct EvalArgs {
    expression: String,

    #[command(flatten)]
    project: ProjectArgs,

    /// Head target consuming the result
    #[arg(short = 't', long)]
    head: Option<String>,

    /// Target owning the expression (defaults to the head target)
    #[arg(long)]
    current: Option<String>,

    /// Compile language for $<COMPILE_LANGUAGE>
    #[arg(short, long, default_value = "")]
    language: String,
}

#[derive(Parser)]
struct PropertyArgs {
    target: String,
    property: String,

    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Parser)]
struct PreprocessArgs {
    input: String,

    #[arg(short, long, default_value = "strip-all-generator-expressions")]
    mode: PreprocessMode,

    /// Prefix relative install-interface entries with ${_IMPORT_PREFIX}/
    #[arg(short, long)]
    resolve_relative: bool,
}

fn load_engine_config(cli: &Cli) -> GenexResult<EngineConfig> {
    match &cli.engine_config {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn load_model(args: &ProjectArgs) -> GenexResult<InMemoryModel> {
    let model = match &args.project {
        Some(path) => InMemoryModel::from_file(path)?,
        None => InMemoryModel::from_spec(ProjectSpec::default())?,
    };
    info!("project loaded.");
    Ok(model)
}

fn find_target(model: &dyn BuildModel, name: &str) -> GenexResult<TargetId> {
    model
        .find_target(name)
        .ok_or_else(|| Error::UnknownTarget(name.to_string()))
}

fn names(model: &dyn BuildModel, targets: impl IntoIterator<Item = TargetId>) -> Vec<String> {
    targets.into_iter().map(|t| model.target_name(t)).collect()
}

/// Prints the evaluation and tells whether it succeeded.
fn report(model: &dyn BuildModel, evaluation: &Evaluation, as_json: bool) -> bool {
    let context = &evaluation.context;
    if as_json {
        let diagnostics: Vec<_> = context
            .diagnostics()
            .iter()
            .map(|d| {
                json!({
                    "severity": d.severity,
                    "expression": d.expression,
                    "message": d.message,
                })
            })
            .collect();
        let report = json!({
            "output": evaluation.output,
            "had_error": context.had_error(),
            "context_sensitive": context.had_context_sensitive_condition(),
            "head_sensitive": context.had_head_sensitive_condition(),
            "depend_targets": names(model, context.depend_targets.iter().copied()),
            "all_targets": names(model, context.all_targets.iter().copied()),
            "source_sensitive_targets": names(model, context.source_sensitive_targets.iter().copied()),
            "seen_target_properties": context.seen_target_properties,
            "external_objects": context.external_objects,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        println!("{}", evaluation.output);
    }
    !context.had_error()
}

fn run(cli: &Cli) -> GenexResult<bool> {
    let engine_config = load_engine_config(cli)?;
    debug!("engine config: {:?}", engine_config);

    match &cli.command {
        Commands::Eval(args) => {
            let model = load_model(&args.project)?;
            let engine = Engine::with_config(&model, engine_config);
            let mut request = engine
                .request(&args.project.config)
                .with_language(&args.language);
            if args.project.json {
                request = request.quiet(true);
            }
            if let Some(current) = &args.current {
                request = request.with_current_target(find_target(&model, current)?);
            }
            if let Some(head) = &args.head {
                request = request.with_head_target(find_target(&model, head)?);
            }
            let evaluation = engine.evaluate(&args.expression, &request);
            Ok(report(&model, &evaluation, args.project.json))
        }
        Commands::Property(args) => {
            let model = load_model(&args.project)?;
            let engine = Engine::with_config(&model, engine_config);
            let target = find_target(&model, &args.target)?;
            let request = engine
                .request(&args.project.config)
                .quiet(args.project.json || engine.config().quiet);
            let evaluation = engine.evaluate_target_property(target, &args.property, &request);
            Ok(report(&model, &evaluation, args.project.json))
        }
        Commands::Tokens { expression } => {
            for token in tokenizer::tokenize(expression).iter() {
                println!("{}\t{}\t{:?}", token.offset, token.kind, token.text);
            }
            Ok(true)
        }
        Commands::Tree { expression } => {
            let tokens = tokenizer::tokenize(expression);
            let nodes = analyzer::parse(tokens.as_slice(), engine_config.max_parse_depth);
            print!("{}", EvaluatorNode::describe(&nodes, expression));
            Ok(true)
        }
        Commands::Preprocess(args) => {
            println!("{}", preprocess(&args.input, args.mode, args.resolve_relative));
            Ok(true)
        }
        Commands::Split { input } => {
            for element in split(input) {
                println!("{}", element);
            }
            Ok(true)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
