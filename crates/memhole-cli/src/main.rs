mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::hex_utils::{parse_hex_address, parse_hex_bytes};

#[derive(Parser)]
#[command(name = "memhole")]
#[command(about = "Inspect and modify process memory through the memhole device")]
#[command(version)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/memhole/config.toml)
    #[arg(short, long, global = true, env = "MEMHOLE_CONFIG")]
    config: Option<PathBuf>,

    /// Device node path
    #[arg(short, long, global = true, env = "MEMHOLE_DEVICE")]
    device: Option<PathBuf>,

    /// Open the device read-write
    #[arg(short, long, global = true)]
    write: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach to a process and report the device state
    Status {
        #[arg(short, long)]
        pid: i32,
    },
    /// Print memory in hexdump format
    Hexdump {
        #[arg(short, long)]
        pid: i32,
        /// Start address (hex)
        address: String,
        #[arg(short, long, default_value_t = 256)]
        size: usize,
        /// Show the ASCII column
        #[arg(short, long)]
        ascii: bool,
    },
    /// Copy a memory range into a file
    Dump {
        #[arg(short, long)]
        pid: i32,
        /// Start address (hex)
        address: String,
        /// Number of bytes
        len: usize,
        output: PathBuf,
    },
    /// Follow a pointer and dump the memory it points at
    Pointer {
        #[arg(short, long)]
        pid: i32,
        /// Address holding the pointer (hex)
        base: String,
        /// Offset added to the pointer (hex)
        #[arg(short, long, default_value = "0")]
        offset: String,
        #[arg(short, long, default_value_t = 64)]
        size: usize,
    },
    /// Write bytes into the target (requires --write)
    Write {
        #[arg(short, long)]
        pid: i32,
        /// Start address (hex)
        address: String,
        /// Bytes to write (hex, e.g. AABB)
        data: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "memhole=debug" } else { "memhole=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = config::resolve(args.config.as_deref(), args.device.as_deref(), args.write)?;
    debug!("Using config: {:?}", config);

    match args.command {
        Command::Status { pid } => commands::status::run(&config, pid),
        Command::Hexdump {
            pid,
            address,
            size,
            ascii,
        } => commands::hexdump::run(&config, pid, parse_hex_address(&address)?, size, ascii),
        Command::Dump {
            pid,
            address,
            len,
            output,
        } => commands::dump::run(&config, pid, parse_hex_address(&address)?, len, &output),
        Command::Pointer {
            pid,
            base,
            offset,
            size,
        } => commands::pointer::run(
            &config,
            pid,
            parse_hex_address(&base)?,
            parse_hex_address(&offset)?,
            size,
        ),
        Command::Write { pid, address, data } => commands::write::run(
            &config,
            pid,
            parse_hex_address(&address)?,
            &parse_hex_bytes(&data)?,
        ),
    }
}
