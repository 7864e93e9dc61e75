use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use pff_header::container::{ContainerHandle, ContainerHeader, CrcPolicy, DecodeOptions};
use pff_header::crc::CrcCheck;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pffinfo", version, about = "Inspect the header of a PST, OST or PAB file")]
struct Cli {
    /// File path to parse
    input: PathBuf,
    /// Logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log: LogLevel,
    /// Header CRC handling: skip, report (default), enforce
    #[arg(long, default_value = "report", value_parser = ["skip", "report", "enforce"])]
    crc: String,
    /// Print the decoded header as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    /// Same as `error`.
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off                    => LevelFilter::Off,
            LogLevel::Fatal | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn                   => LevelFilter::Warn,
            LogLevel::Info                   => LevelFilter::Info,
            LogLevel::Debug                  => LevelFilter::Debug,
            LogLevel::Trace                  => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log.into())
        .init();

    info!("Starting pffinfo v{}...", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = DecodeOptions {
        crc: CrcPolicy::from_name(&cli.crc).unwrap_or_default(),
    };
    let handle = ContainerHandle::new(&cli.input);
    info!("Using file: {}...", handle.path().display());

    let header = handle.decode_with(options)?;
    info!("Identified {} container, {}", header.content_kind.short_name(), header.variant.name());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&header)?);
    } else {
        print_header(&handle, &header);
    }
    info!("Walking b-tree at start offset: {}...", header.root_offset.get());
    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn print_header(handle: &ContainerHandle, header: &ContainerHeader) {
    let handoff = header.btree_handoff();

    println!("── PFF Container ────────────────────────────────────────");
    println!("  Path           {}", handle.path().display());
    println!("  Content        {} [{}]", header.content_kind.name(), header.content_kind.short_name());
    println!("  Format         {} (wVer {})", header.variant.name(), header.format_code);
    println!("  Encryption     {}", header.encryption.name());
    println!("  B-tree root    {} ({} B)", header.root_offset, header.root_offset.get());
    println!("  Page           {} B ({} B payload)", handoff.page.size, handoff.page.payload);
    match &header.crc {
        None => println!("  Header CRC     skipped"),
        Some(report) => {
            println!("  Header CRC     {}", crc_line(&report.partial));
            if let Some(full) = &report.full {
                println!("  Full CRC       {}", crc_line(full));
            }
        }
    }
}

fn crc_line(check: &CrcCheck) -> String {
    if check.is_valid() {
        format!("ok ({:08x})", check.stored)
    } else {
        format!("mismatch (stored {:08x}, computed {:08x})", check.stored, check.computed)
    }
}
