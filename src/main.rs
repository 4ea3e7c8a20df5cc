use clap::Parser;
use coursebill::domain::course::Course;
use coursebill::domain::entity::AuditContext;
use coursebill::domain::payment::Payment;
use coursebill::domain::user::User;
use coursebill::infrastructure::in_memory::InMemoryStore;
use coursebill::interfaces::ops::{Backend, OpReader, outcome_line};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-lines operations file; one outcome line is printed per op.
    ops: PathBuf,

    /// Path to a persistent database (optional). If provided, uses RocksDB;
    /// state and id sequences then survive across runs.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Actor id recorded as created-by/modified-by on every mutation.
    #[arg(long)]
    actor: Option<u64>,
}

fn build_backend(db_path: Option<PathBuf>) -> Result<Backend> {
    match db_path {
        None => Ok(Backend::new(
            Arc::new(InMemoryStore::<User>::new()),
            Arc::new(InMemoryStore::<Course>::new()),
            Arc::new(InMemoryStore::<Payment>::new()),
        )),
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                coursebill::infrastructure::rocksdb::RocksDbStore::open(path).into_diagnostic()?;
            Ok(Backend::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
            ))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => Err(miette::miette!(
            "--db-path requires a build with the storage-rocksdb feature"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = match cli.actor {
        Some(actor) => AuditContext::actor(actor),
        None => AuditContext::system(),
    };

    let backend = build_backend(cli.db_path)?;

    let file = File::open(&cli.ops).into_diagnostic()?;
    let reader = OpReader::new(BufReader::new(file));
    for op in reader.ops() {
        let result = match op {
            Ok(op) => backend.apply(op, &ctx).await,
            Err(e) => Err(e),
        };
        println!("{}", outcome_line(result));
    }

    Ok(())
}
