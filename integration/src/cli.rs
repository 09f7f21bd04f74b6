use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};
use life_opcodes::emit::Repr;

#[derive(Parser, Debug)]
#[command(
    name = "life-tools",
    version,
    about = "Opcode table generator and spec test harness for the life interpreter"
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Regenerate (or check) the opcode representations from the canonical Go listing.
    Opcodes(OpcodesArgs),
    /// Convert and run every `.wast` spec test in a directory.
    Spectest(SpectestArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("outputs").args(["rust_out", "go_out"]).multiple(true)))]
pub struct OpcodesArgs {
    /// Canonical Go source holding the `const ( ... )` opcode block; `-` reads stdin.
    pub source: PathBuf,
    /// Where to write the Rust enum.
    #[arg(long, value_name = "FILE")]
    pub rust_out: Option<PathBuf>,
    /// Where to write the Go `String()` dispatch.
    #[arg(long, value_name = "FILE")]
    pub go_out: Option<PathBuf>,
    /// Compare outputs with what is on disk instead of writing; fail on drift.
    #[arg(long, requires = "outputs")]
    pub check: bool,
    /// Print one rendering to stdout instead of writing files.
    #[arg(long, value_enum, conflicts_with_all = ["rust_out", "go_out"])]
    pub print: Option<PrintFormat>,
    #[arg(long, default_value = "Opcode")]
    pub type_name: String,
    /// Integer representation of the Rust enum: u8, u16 or u32.
    #[arg(long, default_value_t = Repr::U8)]
    pub repr: Repr,
    #[arg(long, default_value = "opcodes")]
    pub go_package: String,
}

#[derive(Args, Debug)]
pub struct SpectestArgs {
    /// Directory scanned (non-recursively) for test definitions.
    pub dir: PathBuf,
    #[arg(long, default_value = "wast2json")]
    pub converter: PathBuf,
    #[arg(long, default_value = "./test_runner")]
    pub runner: PathBuf,
    /// Seconds each tool invocation may run; 0 waits forever.
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub timeout: u64,
    /// Extra attempts for a failed conversion or run.
    #[arg(long, default_value_t = 0)]
    pub retries: u32,
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PrintFormat {
    RustEnum,
    GoDispatch,
    TableJson,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}
