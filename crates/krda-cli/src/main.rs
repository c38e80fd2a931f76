//! krda CLI: generate, inspect and filter KRDA table files.

use std::path::PathBuf;
use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use krda_core::config::EngineConfig;
use krda_core::projection::{ResultDescription, ResultField};
use krda_core::rules::RuleSet;
use krda_core::schema::ColumnType;
use krda_core::types::Scalar;
use krda_filter::FilterJob;
use krda_mem::Heap;
use krda_table::{Table, TableBuilder};

#[derive(Parser)]
#[command(name = "krda")]
#[command(about = "In-memory columnar filter engine over KRDA tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sample KRDA table file
    Gen {
        /// Number of rows to generate
        #[arg(long, default_value = "10000")]
        rows: u32,

        /// Output file path
        #[arg(short, long)]
        out: PathBuf,

        /// Seed for the deterministic generator
        #[arg(long, default_value = "7")]
        seed: u64,
    },

    /// Print the header of a KRDA table file
    Inspect {
        /// Path to the table file
        #[arg(short, long)]
        table: PathBuf,
    },

    /// Run a rule-tree filter over a table file
    Filter {
        /// Path to the table file
        #[arg(short, long)]
        table: PathBuf,

        /// Path to a JSON rule file: a list of AND-groups, OR-ed together
        #[arg(short, long)]
        rules: PathBuf,

        /// Comma-separated projection: column names, plus `@index` for the
        /// source row index. Defaults to every column.
        #[arg(short, long)]
        project: Option<String>,

        /// Worker-thread count (overrides config)
        #[arg(long)]
        workers: Option<usize>,

        /// Rows per batch claim (overrides config)
        #[arg(long)]
        batch_size: Option<u32>,

        /// Result-region cap in bytes (overrides config)
        #[arg(long)]
        max_result_bytes: Option<usize>,

        /// Heap capacity in bytes; defaults to a size derived from the file
        #[arg(long)]
        heap_bytes: Option<usize>,

        /// Print at most this many result rows
        #[arg(long, default_value = "20")]
        limit: u64,

        /// Print only the count and the content digest
        #[arg(long)]
        digest: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Gen { rows, out, seed } => gen_table(rows, &out, seed),
        Commands::Inspect { table } => inspect_table(&table),
        Commands::Filter {
            table,
            rules,
            project,
            workers,
            batch_size,
            max_result_bytes,
            heap_bytes,
            limit,
            digest,
        } => run_filter(
            &table,
            &rules,
            project.as_deref(),
            workers,
            batch_size,
            max_result_bytes,
            heap_bytes,
            limit,
            digest,
        ),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

const SAMPLE_NAMES: &[&str] = &[
    "Alpha", "beta", "Gamma", "delta", "Epsilon", "zeta", "Eta", "theta",
];

fn gen_table(rows: u32, out: &PathBuf, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = TableBuilder::new()
        .column("id", ColumnType::UInt32)
        .column_with_size("name", ColumnType::String, 18)
        .column("score", ColumnType::Float32)
        .column("level", ColumnType::UInt8)
        .column_with_size("joined", ColumnType::Date, 12);

    let mut state = seed | 1;
    let mut next = move || {
        // xorshift64; deterministic per seed
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    for id in 0..rows {
        let name = format!("{}-{}", SAMPLE_NAMES[(next() % 8) as usize], next() % 1000);
        let score = (next() % 10_000) as f32 / 100.0;
        let level = (next() % 10) as i64;
        let joined = format!("2025-{:02}-{:02}", 1 + next() % 12, 1 + next() % 28);
        builder.push_row(&[
            Scalar::Int(id as i64),
            Scalar::Str(name),
            Scalar::Float(score),
            Scalar::Int(level),
            Scalar::Str(joined),
        ])?;
    }

    let bytes = builder.finish();
    fs::write(out, &bytes)?;
    tracing::info!(rows, bytes = bytes.len(), "table written");
    println!("wrote {} rows ({} bytes) to {}", rows, bytes.len(), out.display());
    Ok(())
}

fn inspect_table(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let heap = Heap::with_capacity(bytes.len() + 64);
    let table = Table::load(&heap, &bytes)?;

    println!(
        "rows: {}   stride: {} bytes   columns: {}",
        table.row_count(),
        table.row_stride(),
        table.columns().len()
    );
    for col in table.columns() {
        println!(
            "  {:<16} {:<8} offset {:>4}  size {:>4}",
            col.name, col.ty, col.offset, col.size
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_filter(
    table_path: &PathBuf,
    rules_path: &PathBuf,
    project: Option<&str>,
    workers: Option<usize>,
    batch_size: Option<u32>,
    max_result_bytes: Option<usize>,
    heap_bytes: Option<usize>,
    limit: u64,
    digest_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(table_path)?;
    let rules: RuleSet = serde_json::from_str(&fs::read_to_string(rules_path)?)?;

    // Table plus a full-match result region plus slack.
    let capacity = heap_bytes.unwrap_or(bytes.len() * 3 + 4096);
    let heap = Heap::with_capacity(capacity);
    let table = Table::load(&heap, &bytes)?;

    let mut cfg = EngineConfig::from_env();
    if let Some(n) = workers {
        cfg.worker_count = n;
    }
    if let Some(b) = batch_size {
        cfg.row_batch_size = b;
    }
    if let Some(m) = max_result_bytes {
        cfg.max_result_bytes = Some(m);
    }

    let mut job = FilterJob::new(&heap, &table).with_config(cfg);
    if let Some(spec) = project {
        job = job.project(parse_projection(spec, &table)?);
    }

    let output = job.run(&rules)?;

    if output.truncated {
        eprintln!("warning: result truncated at {} rows", output.count);
    }
    println!("matches: {}", output.count);
    println!("digest:  {}", output.content_digest());

    if !digest_only {
        let header: Vec<String> = output
            .description()
            .fields
            .iter()
            .map(|f| f.column.clone().unwrap_or_else(|| "@index".into()))
            .collect();
        println!("{}", header.join(","));
        for row in output.rows().take(limit as usize) {
            let cells: Vec<String> = (0..header.len()).map(|i| row.value(i).to_string()).collect();
            println!("{}", cells.join(","));
        }
        if output.count > limit {
            println!("... {} more rows", output.count - limit);
        }
    }

    output.free(&heap)?;
    Ok(())
}

fn parse_projection(
    spec: &str,
    table: &Table,
) -> Result<ResultDescription, Box<dyn std::error::Error>> {
    let mut fields = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if item == "@index" {
            fields.push(ResultField::row_index());
        } else {
            let (_, col) = table
                .column(item)
                .ok_or_else(|| format!("unknown column '{item}'"))?;
            fields.push(ResultField::column(&col.name, col.ty, col.size));
        }
    }
    Ok(ResultDescription::new(fields))
}
