//! Native image Dockerfile generator
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use nid::config::{file, runtime};
use nid::native_image::NativeImageTask;
use nid::strategy::BuildStrategy;
use nid::{assembler, docker, jvm, Error};
use std::path::{Path, PathBuf};

/// Generate a Dockerfile that compiles your application into a GraalVM native executable.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Root of the source code tree.
    #[arg(default_value = ".")]
    source_directory: String,

    /// Path to the nid configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Path to the native compile task description (JSON) resolved by the host build.
    #[arg(long)]
    task: Option<String>,

    /// How to package the native executable.
    #[arg(long, value_enum)]
    strategy: Option<BuildStrategy>,

    /// Runtime base image. Defaults depend on the strategy.
    #[arg(long)]
    base_image: Option<String>,

    /// GraalVM image used to compile the executable.
    #[arg(long)]
    builder_image: Option<String>,

    /// Argument passed to the executable at container start. Can be repeated.
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Port to expose. Can be repeated. Only used by the default strategy.
    #[arg(long = "port")]
    ports: Vec<u16>,

    /// Function handler. Only used by the function-platform strategy.
    #[arg(long)]
    default_command: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate the Dockerfile and print it to standard output.
    Dockerfile,
    /// Generate the Dockerfile and write it to disk.
    Write {
        /// Destination file. Defaults to build/docker/DockerfileNative in the source directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the changes the host build must apply to its native compile task, as JSON.
    TaskPatch,
}

/// Read configuration file from disk and merge it with the
/// `default.toml` built-in config.
///
/// If a configuration file name is not set explicitly, this function will
/// detect whether a config file with the default file name exists on disk.
/// If it does, it is used implicitly.
fn read_config(args: &Cli) -> Result<file::File, Error> {
    const DEFAULT_CONFIG_FILE: &str = "nid.toml";

    let config_file = args
        .config
        .clone()
        .or_else(|| existing_file(&args.source_directory, DEFAULT_CONFIG_FILE));

    Ok(if let Some(config_file) = config_file {
        debug!("Using configuration file {config_file}");
        file::File::default_with_user_config_file(&config_file)?
    } else {
        file::File::default()
    })
}

/// Read the native compile task, falling back to the file the host build
/// leaves next to the generated Dockerfile.
fn read_task(args: &Cli) -> Result<Option<NativeImageTask>, Error> {
    const DEFAULT_TASK_FILE: &str = "build/docker/native-image-task.json";

    let task_file = args
        .task
        .clone()
        .or_else(|| existing_file(&args.source_directory, DEFAULT_TASK_FILE));

    Ok(match task_file {
        Some(task_file) => {
            debug!("Using native image task {task_file}");
            Some(NativeImageTask::parse_file(&task_file)?)
        }
        None => None,
    })
}

fn existing_file(directory: &str, name: &str) -> Option<String> {
    let path = Path::new(directory).join(name);
    std::fs::metadata(&path)
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
        .then(|| path.to_string_lossy().into_owned())
}

/// Settings given on the command line, layered over the configuration file.
fn overrides(args: &Cli) -> file::File {
    file::File {
        strategy: args.strategy,
        base_image: args.base_image.clone(),
        builder_image: args.builder_image.clone(),
        args: (!args.args.is_empty()).then(|| args.args.clone()),
        exposed_ports: (!args.ports.is_empty()).then(|| args.ports.clone()),
        default_command: args.default_command.clone(),
        ..file::File::empty()
    }
}

fn main() {
    match run() {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1)
        }
    }
}

fn run() -> Result<(), Error> {
    env_logger::init();

    let args = Cli::parse();
    let cfg_file = read_config(&args)?.overlay(overrides(&args));
    let cfg = runtime::Config::new(&cfg_file, jvm::detect());

    info!("Build strategy: {}", cfg.strategy);
    info!("GraalVM image: {}", cfg.builder_image);

    let task = read_task(&args)?;
    let synthesis = assembler::synthesize(&cfg, task.as_ref())?;

    match args.command {
        Commands::Dockerfile => {
            print!("{}", synthesis.dockerfile);
            Ok(())
        }
        Commands::Write { output } => {
            let destination = output
                .unwrap_or_else(|| Path::new(&args.source_directory).join(docker::DEFAULT_DESTINATION));
            let written = docker::write_dockerfile(&destination, &synthesis.dockerfile)?;
            println!("Dockerfile written to: {}", written.display());
            Ok(())
        }
        Commands::TaskPatch => {
            println!("{}", serde_json::to_string_pretty(&synthesis.patch)?);
            Ok(())
        }
    }
}
