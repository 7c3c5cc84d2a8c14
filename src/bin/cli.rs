//! linhashdb CLI
//!
//! Command-line interface for a store of PCR test records.

use clap::{Parser, Subcommand};
use linhashdb::record::PcrTest;
use linhashdb::sequence::SequenceGenerator;
use linhashdb::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// linhashdb CLI
#[derive(Parser, Debug)]
#[command(name = "linhash-cli")]
#[command(about = "CLI for a linear hash store of PCR test records")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./linhash_data")]
    data_dir: String,

    /// Initial bucket count (power of two; used when creating a store)
    #[arg(short = 'b', long, default_value = "4")]
    initial_buckets: u32,

    /// Primary block size in bytes (used when creating a store)
    #[arg(long, default_value = "1024")]
    primary_block_size: usize,

    /// Overflow block size in bytes (used when creating a store)
    #[arg(long, default_value = "512")]
    overflow_block_size: usize,

    /// Load factor that triggers a bucket split
    #[arg(long, default_value = "0.75")]
    split_threshold: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a test; its code is taken from the store's sequence
    Add {
        /// Patient UUID
        patient: String,

        /// Mark the test positive
        #[arg(long)]
        positive: bool,

        /// Measured value
        #[arg(long, default_value = "0.0")]
        value: f64,

        /// Free-form note
        #[arg(long, default_value = "")]
        note: String,

        /// Test date (unix millis)
        #[arg(long, default_value = "0")]
        date: i64,
    },

    /// Show a test by code
    Get {
        /// The test code
        code: i32,
    },

    /// Replace the fields of an existing test
    Edit {
        /// The test code
        code: i32,

        /// Patient UUID
        patient: String,

        /// Mark the test positive
        #[arg(long)]
        positive: bool,

        /// Measured value
        #[arg(long, default_value = "0.0")]
        value: f64,

        /// Free-form note
        #[arg(long, default_value = "")]
        note: String,

        /// Test date (unix millis)
        #[arg(long, default_value = "0")]
        date: i64,
    },

    /// Delete a test by code
    Del {
        /// The test code
        code: i32,
    },

    /// Print bucket chains block by block
    Dump {
        /// Only this bucket
        #[arg(short, long)]
        bucket: Option<u32>,
    },

    /// Print directory and file counters
    Stats,
}

const SEQUENCE_FILENAME: &str = "pcr_sequence.txt";

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linhashdb=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::debug!("linhashdb CLI v{}", linhashdb::VERSION);
    tracing::debug!("Data directory: {}", args.data_dir);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> linhashdb::Result<()> {
    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .initial_buckets(args.initial_buckets)
        .primary_block_size(args.primary_block_size)
        .overflow_block_size(args.overflow_block_size)
        .split_threshold(args.split_threshold)
        .build();

    let mut engine: Engine<PcrTest> = Engine::open(config)?;

    match args.command {
        Commands::Add {
            patient,
            positive,
            value,
            note,
            date,
        } => {
            let mut sequence = SequenceGenerator::open(engine.data_dir().join(SEQUENCE_FILENAME))?;
            let code = sequence.next_value()?;
            let test = PcrTest::new(date, patient, code, positive, value, note);
            if engine.insert(test)? {
                println!("Added test {}", code);
            } else {
                println!("Test {} already exists", code);
            }
        }
        Commands::Get { code } => match engine.find(&PcrTest::with_code(code))? {
            Some(test) => println!("{:?}", test),
            None => println!("Test {} not found", code),
        },
        Commands::Edit {
            code,
            patient,
            positive,
            value,
            note,
            date,
        } => {
            let test = PcrTest::new(date, patient, code, positive, value, note);
            if engine.edit(&test)? {
                println!("Updated test {}", code);
            } else {
                println!("Test {} not found", code);
            }
        }
        Commands::Del { code } => match engine.delete(&PcrTest::with_code(code))? {
            Some(_) => println!("Deleted test {}", code),
            None => println!("Test {} not found", code),
        },
        Commands::Dump { bucket } => {
            let buckets: Vec<u32> = match bucket {
                Some(b) => vec![b],
                None => (0..engine.bucket_count()).collect(),
            };
            for b in buckets {
                println!("Bucket {}:", b);
                for entry in engine.bucket_chain(b)? {
                    println!(
                        "  {:?} ({}/{} records, next: {:?})",
                        entry.address,
                        entry.valid_count(),
                        entry.block_factor,
                        entry.next
                    );
                    for test in &entry.records {
                        println!("    {:?}", test);
                    }
                }
            }
        }
        Commands::Stats => {
            let stats = engine.stats();
            println!("level:            {}", stats.level);
            println!("next split:       {}", stats.next_split);
            println!("buckets:          {}", stats.bucket_count);
            println!("load factor:      {:.3}", stats.load_factor);
            println!("primary blocks:   {}", stats.primary_blocks);
            println!("primary records:  {}", stats.primary_records);
            println!("overflow blocks:  {}", stats.overflow_blocks);
            println!("overflow records: {}", stats.overflow_records);
        }
    }

    engine.close()
}
