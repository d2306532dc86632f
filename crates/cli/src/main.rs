mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::OutputFormat;

/// swarmpack - Package a project and its fractions into one executable uberjar
#[derive(Parser)]
#[command(name = "swarmpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (ignored when RUST_LOG is set)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Assemble `<name>-swarm.jar`
  Build(BuildArgs),

  /// Print the fractions a compiled artifact needs
  Detect {
    /// Module catalog (YAML, or JSON with a .json extension)
    #[arg(long)]
    catalog: PathBuf,

    /// Compiled jar/war or an exploded classes directory
    artifact: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Print the build manifest embedded in an uberjar
  Inspect {
    archive: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

#[derive(Args)]
pub struct BuildArgs {
  /// The project's compiled artifact
  #[arg(long, requires = "coordinate")]
  project: Option<PathBuf>,

  /// Coordinate of the project artifact, `group:artifact[:packaging]:version`
  #[arg(long)]
  coordinate: Option<String>,

  /// Output base name (defaults to the project's artifactId)
  #[arg(long)]
  name: Option<String>,

  #[arg(long, default_value = "target")]
  output_dir: PathBuf,

  /// Application entry point handed to the bootstrap runtime
  #[arg(long)]
  main_class: Option<String>,

  /// Property written to the generated properties, as KEY=VALUE
  #[arg(short = 'P', long = "property", value_name = "KEY=VALUE")]
  properties: Vec<String>,

  #[arg(long = "dependency", value_name = "COORD")]
  dependencies: Vec<String>,

  #[arg(long = "fraction", value_name = "COORD")]
  fractions: Vec<String>,

  /// Directory copied under `modules/`; its module.xml files are registered
  #[arg(long = "module-dir", value_name = "DIR")]
  module_dirs: Vec<PathBuf>,

  #[arg(long)]
  catalog: Option<PathBuf>,

  /// Maven-layout repository to resolve from (defaults to the local repository)
  #[arg(long)]
  repository: Option<PathBuf>,

  /// Resolve transitive dependencies of declared dependencies
  #[arg(long)]
  transitive: bool,

  /// Copy dependencies to the local repository instead of embedding them
  #[arg(long)]
  no_bundle: bool,

  /// Do not scan the project for fractions
  #[arg(long)]
  no_detect: bool,

  /// Build without the project artifact
  #[arg(long)]
  hollow: bool,

  #[arg(long, value_enum, default_value_t)]
  format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose && std::env::var_os("RUST_LOG").is_none() {
    EnvFilter::new("swarmpack=debug,swarmpack_lib=debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build(args) => cmd::cmd_build(args),
    Commands::Detect {
      catalog,
      artifact,
      format,
    } => cmd::cmd_detect(&catalog, &artifact, format),
    Commands::Inspect { archive, format } => cmd::cmd_inspect(&archive, format),
  }
}
