use clap::{Parser, Subcommand};
use kinta_core::application::backfill::{BackfillJob, BackfillReport};
use kinta_core::application::correction::BalanceCorrection;
use kinta_core::application::provisioner::AccountProvisioner;
use kinta_core::application::reconciler::WebhookReconciler;
use kinta_core::domain::ports::{AccountStoreRef, TransactionStoreRef, UserStoreRef};
use kinta_core::domain::user::Balance;
use kinta_core::infrastructure::in_memory::{
    InMemoryAccountStore, InMemoryMailer, InMemoryTransactionStore, InMemoryUserStore,
};
use kinta_core::infrastructure::scripted::{ScriptedAccountProvider, ScriptedResponse};
use kinta_core::interfaces::json::event_reader::EventReader;
use kinta_core::interfaces::state::StateSnapshot;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay provider webhook events against a state snapshot
    Reconcile {
        /// Wallet state snapshot (JSON)
        state: PathBuf,
        /// Webhook events, one JSON object per line
        events: PathBuf,
    },
    /// Run one capped backfill pass with scripted aggregator responses
    Backfill {
        /// Wallet state snapshot (JSON)
        state: PathBuf,
        /// Scripted aggregator responses (JSON array)
        responses: PathBuf,
    },
    /// Overwrite a user's balance from a transaction reference
    CorrectBalance {
        /// Wallet state snapshot (JSON)
        state: PathBuf,
        #[arg(long)]
        tx_ref: String,
        #[arg(long)]
        new_balance: Decimal,
    },
}

struct Stores {
    users: UserStoreRef,
    accounts: AccountStoreRef,
    transactions: TransactionStoreRef,
}

fn in_memory_stores() -> Stores {
    Stores {
        users: Arc::new(InMemoryUserStore::new()),
        accounts: Arc::new(InMemoryAccountStore::new()),
        transactions: Arc::new(InMemoryTransactionStore::new()),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn build_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    use kinta_core::infrastructure::rocksdb::RocksDbStore;

    match db_path {
        Some(db_path) => {
            let store = RocksDbStore::open(db_path).into_diagnostic()?;
            Ok(Stores {
                users: Arc::new(store.clone()),
                accounts: Arc::new(store.clone()),
                transactions: Arc::new(store),
            })
        }
        None => Ok(in_memory_stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

#[derive(Serialize)]
struct EventReport {
    status: u16,
    message: String,
    updated: bool,
}

#[derive(Serialize)]
struct UserBalanceLine {
    user_id: Uuid,
    full_name: String,
    balance: Balance,
}

#[derive(Serialize)]
struct ReconcileRunReport {
    events: Vec<EventReport>,
    users: Vec<UserBalanceLine>,
}

#[derive(Serialize)]
struct BackfillRunReport {
    #[serde(flatten)]
    report: BackfillReport,
    notifications_sent: usize,
}

#[derive(Serialize)]
struct CorrectionReport {
    status: u16,
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stores = build_stores(cli.db_path)?;

    match cli.command {
        Command::Reconcile { state, events } => {
            let snapshot = load_state(&state, &stores).await?;
            let reconciler =
                WebhookReconciler::new(stores.users.clone(), stores.transactions.clone());

            let file = File::open(events).into_diagnostic()?;
            let mut rows = Vec::new();
            for event_result in EventReader::new(file).events() {
                match event_result.and_then(|incoming| incoming.into_event()) {
                    Ok(event) => {
                        let outcome = reconciler.reconcile(&event).await;
                        rows.push(EventReport {
                            status: outcome.http_status(),
                            message: outcome.message().to_string(),
                            updated: outcome.updated(),
                        });
                    }
                    Err(e) => {
                        eprintln!("Error reading event: {e}");
                        rows.push(EventReport {
                            status: 400,
                            message: e.to_string(),
                            updated: false,
                        });
                    }
                }
            }

            let mut users = Vec::new();
            for user in &snapshot.users {
                if let Some(current) = stores.users.get(user.id).await.into_diagnostic()? {
                    users.push(UserBalanceLine {
                        user_id: current.id,
                        full_name: current.full_name,
                        balance: current.balance,
                    });
                }
            }

            print_report(&ReconcileRunReport { events: rows, users })?;
        }
        Command::Backfill { state, responses } => {
            load_state(&state, &stores).await?;

            let responses: Vec<ScriptedResponse> =
                serde_json::from_reader(File::open(responses).into_diagnostic()?)
                    .into_diagnostic()?;
            let provider = Arc::new(ScriptedAccountProvider::new(responses));
            let mailer = Arc::new(InMemoryMailer::new());

            let provisioner = AccountProvisioner::new(provider, stores.accounts.clone());
            let job = BackfillJob::new(
                stores.users.clone(),
                stores.accounts.clone(),
                provisioner,
                mailer.clone(),
            );
            let report = job.run().await.into_diagnostic()?;

            print_report(&BackfillRunReport {
                report,
                notifications_sent: mailer.sent().await.len(),
            })?;
        }
        Command::CorrectBalance {
            state,
            tx_ref,
            new_balance,
        } => {
            load_state(&state, &stores).await?;

            let correction =
                BalanceCorrection::new(stores.users.clone(), stores.transactions.clone());
            let outcome = correction.correct(&tx_ref, Balance::new(new_balance)).await;

            print_report(&CorrectionReport {
                status: outcome.http_status(),
                message: outcome.message().to_string(),
            })?;
        }
    }

    Ok(())
}

async fn load_state(path: &Path, stores: &Stores) -> Result<StateSnapshot> {
    let file = File::open(path).into_diagnostic()?;
    let snapshot = StateSnapshot::from_reader(file).into_diagnostic()?;
    snapshot
        .seed(
            stores.users.as_ref(),
            stores.accounts.as_ref(),
            stores.transactions.as_ref(),
        )
        .await
        .into_diagnostic()?;
    Ok(snapshot)
}

fn print_report<T: Serialize>(report: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(report).into_diagnostic()?;
    println!("{out}");
    Ok(())
}
