use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tiacov::cli;
use tiacov::config::{CollectorConfig, ExcludeRule, DEFAULT_OUTPUT_ROOT, DEFAULT_SCHEMA_TAG};
use tiacov::model::TestDescriptor;
use tiacov::parsers::Format;

/// Per-test coverage collection for test impact analysis.
#[derive(Parser)]
#[command(name = "tiacov", version, about)]
struct Cli {
    #[command(flatten)]
    collector: CollectorArgs,

    /// Log at debug level regardless of RUST_LOG.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CollectorArgs {
    /// Root of the sources to measure.
    #[arg(long, global = true, default_value = ".")]
    source_root: PathBuf,

    /// Where per-test artifacts are written.
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: PathBuf,

    /// Glob (relative to the source root) to leave untraced. Repeatable;
    /// replaces the defaults when given.
    #[arg(long, global = true)]
    omit: Vec<String>,

    /// Drop files whose relative path contains this text. Repeatable; any
    /// exclude flag replaces the default rule ("test").
    #[arg(long, global = true)]
    exclude: Vec<String>,

    /// Drop files whose relative path ends with this text. Repeatable.
    #[arg(long, global = true)]
    exclude_suffix: Vec<String>,

    /// Schema tag stamped on every file report.
    #[arg(long, global = true, default_value = DEFAULT_SCHEMA_TAG)]
    schema_tag: String,
}

impl CollectorArgs {
    fn into_config(self) -> CollectorConfig {
        let mut config = CollectorConfig::default()
            .with_source_root(self.source_root)
            .with_output_root(self.output_root)
            .with_schema_tag(self.schema_tag);
        if !self.omit.is_empty() {
            config = config.with_omit(self.omit);
        }
        if !self.exclude.is_empty() || !self.exclude_suffix.is_empty() {
            let rules = self
                .exclude
                .into_iter()
                .map(ExcludeRule::Contains)
                .chain(self.exclude_suffix.into_iter().map(ExcludeRule::EndsWith))
                .collect();
            config = config.with_exclude(rules);
        }
        config
    }
}

#[derive(Args)]
struct TestArgs {
    /// Test name as the runner reports it, e.g. "test_get_users[admin]".
    #[arg(long)]
    test: String,

    /// Enclosing class or suite, e.g. "TestUsersAPI".
    #[arg(long)]
    class: Option<String>,

    /// Path of the coverage dump (LCOV or Go cover profile).
    #[arg(long)]
    dump: PathBuf,

    /// Override dump format detection (lcov, gocover).
    #[arg(long)]
    format: Option<Format>,
}

impl TestArgs {
    fn descriptor(&self) -> TestDescriptor {
        TestDescriptor {
            name: self.test.clone(),
            class: self.class.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the output directories.
    Init,

    /// Run one test command under coverage and save its artifact.
    Exec {
        #[command(flatten)]
        test: TestArgs,

        /// The test command to run.
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Save the artifact for a test from an already-written dump.
    Record {
        #[command(flatten)]
        test: TestArgs,
    },

    /// Show what a per-test artifact covers.
    Summary {
        /// Path to the artifact JSON file.
        artifact: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    let config = args.collector.into_config();

    let output = match args.command {
        Commands::Init => cli::cmd_init(&config)?,
        Commands::Record { test } => {
            cli::cmd_record(config, &test.descriptor(), &test.dump, test.format)?
        }
        Commands::Summary { artifact } => cli::cmd_summary(&artifact)?,
        Commands::Exec { test, command } => {
            let outcome =
                cli::cmd_exec(config, &test.descriptor(), &test.dump, test.format, &command)?;
            if let Some(path) = outcome.artifact {
                println!("Saved {}", path.display());
            }
            std::process::exit(outcome.exit_code);
        }
    };

    print!("{output}");
    Ok(())
}
