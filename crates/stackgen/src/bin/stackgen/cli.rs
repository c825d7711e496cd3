//! stackgen cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; stackgen ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build all declared resources and print the synthesized stack
    #[command(alias = "build")]
    Synth(SynthCommand),

    /// Print the conventional name for a resource
    Name(NameCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct SynthCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct NameCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Base name of the resource
    pub base_name: String,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Configuration file to load
    ///
    /// Use `-` to read from stdin.
    #[clap(short = 'f', long = "input-file", default_value = stackgen::config::DEFAULT_FILE_NAME)]
    pub file: PathBuf,
}

impl InputArgs {
    pub fn is_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,

    /// Write to a file instead of stdout
    #[clap(short = 'o', long = "output-file")]
    pub file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Hcl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Hcl => f.write_str("hcl"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Loaded declarations
    Declarations,
    /// Supported resource types
    Types,
    /// Resources referenced by each declaration
    References,
}
