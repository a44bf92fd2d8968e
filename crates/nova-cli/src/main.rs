use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nova_config::NovaConfig;
use nova_core::{Location, ProjectId, SearchScope, SymbolFilter, SymbolKind};
use nova_index::{SearchQuery, Symbol};
use nova_project::Solution;
use nova_router::{DispatchOutcome, InProcessWorker, SearchOptions, SearchTarget, SymbolFinder};
use nova_scheduler::CancellationToken;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nova", version, about = "Nova CLI (declaration search, indexing)")]
struct Cli {
    /// Config file (defaults to `nova.toml` next to the solution file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find declarations with an exact name
    Find(FindArgs),
    /// Find declarations matching a fuzzy pattern
    Pattern(PatternArgs),
    /// Build the symbol tree index of every project
    Index(IndexArgs),
}

#[derive(Args)]
struct FindArgs {
    /// Solution file (JSON)
    solution: PathBuf,
    /// Declaration name; never split on `.`
    name: String,
    /// Compare names case-insensitively
    #[arg(long)]
    ignore_case: bool,
    #[command(flatten)]
    search: SearchFlags,
}

#[derive(Args)]
struct PatternArgs {
    /// Solution file (JSON)
    solution: PathBuf,
    /// Fuzzy pattern, e.g. `tc` for `TestCase`
    pattern: String,
    #[command(flatten)]
    search: SearchFlags,
}

#[derive(Args)]
struct SearchFlags {
    /// Only search this project
    #[arg(long)]
    project: Option<u32>,
    /// Symbol categories, e.g. `type,member`
    #[arg(long, default_value = "all")]
    filter: SymbolFilter,
    /// Include declarations from referenced libraries
    #[arg(long)]
    metadata: bool,
    /// Route the query through an in-process search host
    #[arg(long)]
    remote: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IndexArgs {
    /// Solution file (JSON)
    solution: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    match cli.command {
        Command::Find(args) => {
            let session = Session::open(cli.config.as_deref(), &args.solution, args.search.remote)?;
            let query = SearchQuery::by_name(args.name, args.ignore_case);
            let outcome = runtime.block_on(session.search(&query, &args.search))?;
            print_output(&SearchReport::new(&outcome), args.search.json)?;
            Ok(0)
        }
        Command::Pattern(args) => {
            let session = Session::open(cli.config.as_deref(), &args.solution, args.search.remote)?;
            let query = SearchQuery::fuzzy(args.pattern);
            let outcome = runtime.block_on(session.search(&query, &args.search))?;
            print_output(&SearchReport::new(&outcome), args.search.json)?;
            Ok(0)
        }
        Command::Index(args) => {
            let session = Session::open(cli.config.as_deref(), &args.solution, false)?;
            let report = runtime.block_on(session.index())?;
            print_output(&report, args.json)?;
            Ok(0)
        }
    }
}

/// A loaded solution plus the finder configured for it.
struct Session {
    solution: Arc<Solution>,
    finder: SymbolFinder,
}

impl Session {
    fn open(config_path: Option<&Path>, solution_path: &Path, remote: bool) -> Result<Self> {
        let config = match config_path {
            Some(path) => NovaConfig::load_from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                let root = solution_path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let (config, path) = nova_config::load_for_workspace(root)
                    .with_context(|| format!("failed to load config for {}", root.display()))?;
                if let Some(path) = path {
                    tracing::debug!(target = "nova.cli", path = %path.display(), "using config");
                }
                config
            }
        };
        nova_config::init_tracing(&config.logging);

        let solution = nova_project::load_solution(solution_path)
            .with_context(|| format!("failed to load solution {}", solution_path.display()))?;
        let solution = Arc::new(solution);

        let mut finder = SymbolFinder::from_config(&config.search);
        if remote {
            let worker = Arc::new(InProcessWorker::new(finder.engine().clone()));
            worker.register(solution.clone());
            finder = finder.with_remote(worker);
        }
        Ok(Self { solution, finder })
    }

    async fn search(&self, query: &SearchQuery, flags: &SearchFlags) -> Result<DispatchOutcome> {
        let target = match flags.project {
            Some(raw) => SearchTarget::Project(ProjectId::new(raw)),
            None => SearchTarget::Solution,
        };
        let scope = if flags.metadata {
            SearchScope::SourceAndMetadata
        } else {
            SearchScope::SourceOnly
        };
        let options = SearchOptions::default()
            .with_filter(flags.filter)
            .with_scope(scope);
        let token = CancellationToken::new();
        let outcome = self
            .finder
            .search(self.solution.as_ref(), target, query, &options, &token)
            .await?;
        Ok(outcome)
    }

    async fn index(&self) -> Result<IndexReport> {
        let cache = self.finder.cache();
        let token = CancellationToken::new();
        let mut projects = Vec::with_capacity(self.solution.len());
        for project in self.solution.projects() {
            let index = cache
                .get_or_build(project, &token)
                .await
                .with_context(|| format!("failed to index {}", project.name()))?;
            projects.push(ProjectIndexReport {
                id: project.id(),
                name: project.name().to_owned(),
                fingerprint: index.fingerprint().to_hex(),
                nodes: index.node_count(),
                symbols: index.symbol_count(),
            });
        }
        Ok(IndexReport {
            persist_dir: cache.persist_dir().map(Path::to_path_buf),
            built: cache.build_count(),
            loaded: cache.load_count(),
            projects,
        })
    }
}

#[derive(Serialize)]
struct SearchReport {
    trace: String,
    remote: bool,
    symbols: Vec<SymbolRecord>,
}

impl SearchReport {
    fn new(outcome: &DispatchOutcome) -> Self {
        Self {
            trace: outcome.trace.to_string(),
            remote: outcome.trace.remote_succeeded(),
            symbols: outcome.symbols.iter().map(SymbolRecord::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct SymbolRecord {
    project: ProjectId,
    key: String,
    name: String,
    kind: SymbolKind,
    locations: Vec<Location>,
}

impl From<&Symbol> for SymbolRecord {
    fn from(symbol: &Symbol) -> Self {
        Self {
            project: symbol.project(),
            key: symbol.to_string(),
            name: symbol.name().to_owned(),
            kind: symbol.kind(),
            locations: symbol.locations().to_vec(),
        }
    }
}

#[derive(Serialize)]
struct IndexReport {
    persist_dir: Option<PathBuf>,
    built: u64,
    loaded: u64,
    projects: Vec<ProjectIndexReport>,
}

#[derive(Serialize)]
struct ProjectIndexReport {
    id: ProjectId,
    name: String,
    fingerprint: String,
    nodes: usize,
    symbols: usize,
}

fn print_output<T: Serialize + 'static>(value: &T, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
        return Ok(());
    }

    // Human output for the report types. Everything else falls back to pretty JSON.
    let any = value as &dyn std::any::Any;
    if let Some(report) = any.downcast_ref::<SearchReport>() {
        for symbol in &report.symbols {
            println!("{} [{}] {}", symbol.key, symbol.kind, symbol.project);
        }
        println!(
            "summary: {} declarations ({})",
            report.symbols.len(),
            report.trace
        );
    } else if let Some(report) = any.downcast_ref::<IndexReport>() {
        for project in &report.projects {
            println!("indexed: {} ({})", project.name, project.id);
            println!("  fingerprint: {}", project.fingerprint);
            println!("  nodes: {}", project.nodes);
            println!("  symbols: {}", project.symbols);
        }
        match &report.persist_dir {
            Some(dir) => println!("persisted to: {}", dir.display()),
            None => println!("persisted to: (disabled)"),
        }
        println!("summary: {} built, {} loaded", report.built, report.loaded);
    } else {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
    }
    Ok(())
}
