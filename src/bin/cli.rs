//! mmaprecord CLI
//!
//! Command-line interface for saving and inspecting record files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mmaprecord::config::{JournalMode, JournalSyncStrategy, OversizePolicy};
use mmaprecord::journal::JournalReader;
use mmaprecord::store::prior_record;
use mmaprecord::{RecordStore, SaveOutcome, StoreConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// mmaprecord CLI
#[derive(Parser, Debug)]
#[command(name = "mmaprecord-cli")]
#[command(about = "CLI for the mmaprecord single-record store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a store, save one record, release it
    Save {
        /// Buffer file path
        #[arg(short, long)]
        buffer: PathBuf,

        /// Journal file path
        #[arg(short, long)]
        journal: PathBuf,

        /// Record capacity in bytes
        #[arg(short, long, default_value = "1000")]
        capacity: usize,

        /// Append the record to the journal
        #[arg(long)]
        append_journal: bool,

        /// msync the mapping before releasing
        #[arg(long)]
        flush: bool,

        /// Fail instead of dropping payloads that do not fit
        #[arg(long)]
        strict: bool,

        /// The record text
        payload: String,
    },

    /// Print the record a buffer file currently holds
    Inspect {
        /// Buffer file path
        #[arg(short, long)]
        buffer: PathBuf,

        /// Maximum number of bytes to look at
        #[arg(short, long, default_value = "1000")]
        capacity: usize,
    },

    /// Verify an append-mode journal and print its entries
    Journal {
        /// Journal file path
        #[arg(short, long)]
        journal: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mmaprecord=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> mmaprecord::Result<()> {
    match command {
        Commands::Save {
            buffer,
            journal,
            capacity,
            append_journal,
            flush,
            strict,
            payload,
        } => {
            let journal_mode = if append_journal {
                JournalMode::Append(JournalSyncStrategy::EveryWrite)
            } else {
                JournalMode::Inert
            };
            let oversize_policy = if strict {
                OversizePolicy::Reject
            } else {
                OversizePolicy::Drop
            };

            let config = StoreConfig::builder()
                .capacity(capacity)
                .journal_mode(journal_mode)
                .oversize_policy(oversize_policy)
                .build();

            let mut store = RecordStore::open_with(&buffer, &journal, &config)?;
            match store.save(&payload)? {
                SaveOutcome::Stored { len } => println!("stored {} bytes", len),
                SaveOutcome::Dropped { len } => {
                    println!("dropped {} bytes (capacity {})", len, capacity)
                }
            }
            if flush {
                store.flush()?;
            }
            store.release()
        }

        Commands::Inspect { buffer, capacity } => {
            match prior_record(&buffer, capacity)? {
                Some(record) => println!("{}", record),
                None => println!("(empty)"),
            }
            Ok(())
        }

        Commands::Journal { journal } => {
            let reader = JournalReader::open(&journal)?;
            for entry in reader.entries() {
                println!(
                    "{}\t{}\t{}",
                    entry.lsn,
                    entry.timestamp_ms,
                    String::from_utf8_lossy(&entry.payload)
                );
            }
            let stats = reader.verify();
            println!(
                "entries={} corrupted={} last_lsn={} torn_tail_bytes={}",
                stats.entries, stats.corrupted, stats.last_lsn, stats.torn_tail_bytes
            );
            Ok(())
        }
    }
}
