use std::{
    io::{self, Read},
    path::Path,
    time::Duration,
};

use clap::Parser;
use eyre::{bail, Result, WrapErr};
use life_opcodes::{
    emit::{Emitter, GoDispatchEmitter, GoDispatchOptions, RustEnumEmitter, RustEnumOptions},
    parse_canonical, sync_outputs, OpcodeTable, Output, SyncMode,
};
use life_spectest::{Harness, HarnessConfig};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command, OpcodesArgs, PrintFormat, ReportFormat, SpectestArgs};

fn setup_tracing_with_log_level(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing_with_log_level(match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    });

    match cli.command {
        Command::Opcodes(args) => opcodes(args),
        Command::Spectest(args) => spectest(args),
    }
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .wrap_err("reading canonical source from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading canonical source {}", path.display()))
}

fn opcodes(args: OpcodesArgs) -> Result<()> {
    let text = read_source(&args.source)?;
    let table = parse_canonical(&text)
        .wrap_err_with(|| format!("parsing {}", args.source.display()))?;
    tracing::info!(count = table.len(), "parsed opcode table");

    let rust = RustEnumEmitter::new(
        RustEnumOptions::default()
            .with_type_name(args.type_name.as_str())
            .with_repr(args.repr),
    );
    let go = GoDispatchEmitter::new(
        GoDispatchOptions::default()
            .with_package(args.go_package.as_str())
            .with_type_name(args.type_name.as_str()),
    );

    let mut outputs = Vec::new();
    if let Some(path) = args.rust_out {
        outputs.push(Output {
            emitter: Box::new(rust.clone()),
            path,
        });
    }
    if let Some(path) = args.go_out {
        outputs.push(Output {
            emitter: Box::new(go.clone()),
            path,
        });
    }

    if outputs.is_empty() {
        return print_renderings(&table, args.print, &rust, &go);
    }

    let mode = if args.check {
        SyncMode::Check
    } else {
        SyncMode::Write
    };
    let outcomes = sync_outputs(&table, &outputs, mode)?;
    let mut drifted = 0;
    for outcome in &outcomes {
        println!("{}: {}", outcome.path.display(), outcome.status);
        if outcome.status.is_drift() {
            drifted += 1;
        }
    }
    if drifted > 0 {
        bail!(
            "{drifted} generated file(s) out of date with {}",
            args.source.display()
        );
    }
    Ok(())
}

fn print_renderings(
    table: &OpcodeTable,
    print: Option<PrintFormat>,
    rust: &RustEnumEmitter,
    go: &GoDispatchEmitter,
) -> Result<()> {
    match print {
        Some(PrintFormat::RustEnum) => print!("{}", rust.render(table)?),
        Some(PrintFormat::GoDispatch) => print!("{}", go.render(table)?),
        Some(PrintFormat::TableJson) => println!("{}", serde_json::to_string_pretty(table)?),
        None => {
            // Render both before printing either, so a bad name prints nothing.
            let rust = rust.render(table)?;
            let go = go.render(table)?;
            print!("{rust}\n{go}");
        }
    }
    Ok(())
}

fn spectest(args: SpectestArgs) -> Result<()> {
    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let config = HarnessConfig::default()
        .with_converter(args.converter)
        .with_runner(args.runner)
        .with_timeout(timeout)
        .with_retries(args.retries);

    let report = Harness::new(config).run_dir(&args.dir)?;
    match args.format {
        ReportFormat::Text => println!("{report}"),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
