//! `togo`: the thin argument-parsing shell over `togo_compiler`'s library
//! functions (spec §4.6). Every subcommand opens the project, does its one
//! thing, and persists whatever it touched before exiting.

use std::path::PathBuf;

use clap::{AppSettings, Parser, Subcommand};
use togo_compiler::commands::{self, SyncStatus};
use togo_compiler::manager::CompilerManager;
use togo_compiler::project::Project;

#[derive(Parser, Debug)]
#[clap(name = "togo", about = "Resource pipeline CLI", version, author)]
#[clap(setting(AppSettings::ArgRequiredElseHelp))]
struct Cli {
    /// Project root. Falls back to `TOGO_PROJECT`, then the current directory.
    #[clap(long, env = "TOGO_PROJECT", default_value = ".")]
    project_path: PathBuf,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered packages, or one package's resources with `--recursive`.
    List {
        package: Option<String>,
        #[clap(short, long)]
        recursive: bool,
    },
    /// Create a new package and register it with the project.
    Create { name: String },
    /// Reconcile a package's manifest against its source tree.
    Sync { package: String },
    /// Recompile a package's out-of-date entries.
    Compile {
        package: String,
        #[clap(long)]
        force: bool,
    },
    /// Compile, then write the package's archive if anything changed.
    Pack {
        package: String,
        #[clap(long)]
        force: bool,
    },
    /// Drop holes from a package's manifest and renumber the survivors.
    Compact { package: String },
}

fn build_manager() -> CompilerManager {
    let mut manager = CompilerManager::new();
    manager.register(Box::new(togo_compiler::compilers::TestResourceCompiler));
    manager.register(Box::new(togo_compiler::compilers::ShaderPreludeCompiler));
    manager.register(Box::new(togo_compiler::compilers::ShaderCompiler));
    manager.register(Box::new(togo_compiler::compilers::RenderConfigCompiler::new()));
    manager
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut project = Project::load(&cli.project_path)?;
    let mut manager = build_manager();
    commands::open_all(&project, &mut manager)?;

    match cli.command {
        Commands::List { package, recursive } => {
            let _span = tracing::info_span!("list").entered();
            for line in commands::list(&manager, package.as_deref(), recursive) {
                println!("{line}");
            }
        }
        Commands::Create { name } => {
            let _span = tracing::info_span!("create", name = %name).entered();
            commands::create(&mut project, &mut manager, &name)?;
            project.save()?;
            commands::save_all(&manager)?;
        }
        Commands::Sync { package } => {
            let _span = tracing::info_span!("sync", package = %package).entered();
            let statuses = commands::sync(&mut manager, &package)?;
            for (path, status) in &statuses {
                println!("{}\t{path}", status.code());
            }
            let added = statuses.iter().filter(|(_, s)| matches!(s, SyncStatus::Added)).count();
            let removed = statuses.iter().filter(|(_, s)| matches!(s, SyncStatus::Deleted)).count();
            tracing::info!(added, removed, "sync finished");
            commands::save_all(&manager)?;
        }
        Commands::Compile { package, force } => {
            let _span = tracing::info_span!("compile", package = %package, force).entered();
            let recompiled = commands::compile(&mut manager, &package, force)?;
            println!("{recompiled} entries recompiled");
            commands::save_all(&manager)?;
        }
        Commands::Pack { package, force } => {
            let _span = tracing::info_span!("pack", package = %package, force).entered();
            let wrote = commands::pack(&mut manager, &package, force)?;
            println!("{}", if wrote { "archive written" } else { "archive up to date" });
            commands::save_all(&manager)?;
        }
        Commands::Compact { package } => {
            let _span = tracing::info_span!("compact", package = %package).entered();
            commands::compact(&mut manager, &package)?;
            commands::save_all(&manager)?;
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("togo: {err}");
        std::process::exit(1);
    }
}
