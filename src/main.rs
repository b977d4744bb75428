//! txledger - inspect and drive a transaction ledger file

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use std::path::PathBuf;
use txledger::transaction::{FileLedger, LedgerConfig, TransactionId, TransactionManager};
use txledger::SyncMode;

/// txledger - inspect and drive a transaction ledger file
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base path of the ledger; the file lives at <LEDGER>.xid
    #[arg(short, long, default_value = "./txledger")]
    ledger: PathBuf,

    /// Force metadata as well as data on every durability barrier
    #[arg(long)]
    full_sync: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new, empty ledger
    Init,
    /// Allocate a new transaction and print its ID
    Begin,
    /// Mark a transaction as committed
    Commit { xid: u64 },
    /// Mark a transaction as aborted
    Abort { xid: u64 },
    /// Print the state of a transaction
    Status { xid: u64 },
    /// Print the state of every allocated transaction
    Dump,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let sync_mode = if args.full_sync {
        SyncMode::Full
    } else {
        SyncMode::Data
    };
    let config = LedgerConfig::default().with_sync_mode(sync_mode);

    let ledger = if matches!(args.command, Command::Init) {
        FileLedger::create_with(&args.ledger, config).context("Failed to create ledger")?
    } else {
        FileLedger::open_with(&args.ledger, config).context("Failed to open ledger")?
    };

    run(&ledger, args.command)?;
    ledger.close().context("Failed to close ledger")?;
    Ok(())
}

fn run(ledger: &FileLedger, command: Command) -> Result<()> {
    match command {
        Command::Init => {
            println!("created {}", ledger.path().display());
        }
        Command::Begin => {
            let xid = ledger.begin()?;
            println!("{}", xid.value());
        }
        Command::Commit { xid } => {
            ledger
                .commit(TransactionId::new(xid))
                .with_context(|| format!("Failed to commit {}", xid))?;
        }
        Command::Abort { xid } => {
            ledger
                .abort(TransactionId::new(xid))
                .with_context(|| format!("Failed to abort {}", xid))?;
        }
        Command::Status { xid } => {
            let state = ledger.state(TransactionId::new(xid))?;
            println!("{}", state);
        }
        Command::Dump => {
            println!("{} transactions", ledger.counter());
            for (xid, state) in ledger.snapshot()? {
                println!("{:>10}  {}", xid.value(), state);
            }
        }
    }
    Ok(())
}
