use crate::utils::parser::parse_vector;
use clap::{Args, Parser, Subcommand};
use nalgebra::Vector3;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "pointset - pack, inspect and transform serialized point-set collections.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a collection from a TOML manifest and write it in binary form.
    Pack(PackArgs),
    /// Print the counts and bounding boxes of a binary collection.
    Inspect(InspectArgs),
    /// Copy one array (or one set of an array) into a standalone collection.
    Extract(ExtractArgs),
    /// Move every point of a collection, or of one of its arrays.
    Translate(TranslateArgs),
}

/// Arguments for the `pack` subcommand.
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Path to the TOML pack manifest.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the binary collection file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to a binary collection file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Also list every set of every array.
    #[arg(long)]
    pub sets: bool,
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Path to the source binary collection file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the extracted collection file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Index of the array to extract.
    #[arg(short, long, value_name = "INT")]
    pub array: usize,

    /// Index of a single set within the array to extract.
    #[arg(short, long, value_name = "INT")]
    pub set: Option<usize>,
}

/// Arguments for the `translate` subcommand.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Path to the source binary collection file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the translated collection file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Displacement to apply, as 'x,y,z'.
    #[arg(
        short,
        long,
        required = true,
        value_name = "X,Y,Z",
        value_parser = parse_vector,
        allow_hyphen_values = true
    )]
    pub delta: Vector3<f64>,

    /// Only move the array at this index.
    #[arg(short, long, value_name = "INT")]
    pub array: Option<usize>,
}
