use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payrecon::application::customer::ClientContext;
use payrecon::application::reconciler::OrderReconciler;
use payrecon::application::service::ReconciliationService;
use payrecon::domain::order::Order;
use payrecon::domain::ports::OrderStoreBox;
use payrecon::domain::urls::UrlProvider;
use payrecon::infrastructure::in_memory::{
    InMemoryCheckoutSession, InMemoryCommentHistory, InMemoryNotifier, InMemoryOrderStore,
};
use payrecon::infrastructure::settings::Settings;
use payrecon::interfaces::csv::order_writer::OrderWriter;
use payrecon::interfaces::json::delivery_reader::{Delivery, DeliveryReader};
use payrecon::interfaces::json::order_loader::read_orders;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay recorded gateway deliveries (NDJSON) against an order snapshot
    Replay {
        /// Deliveries file, one JSON object per line
        deliveries: PathBuf,

        /// Order snapshot (JSON array)
        #[arg(long)]
        orders: PathBuf,

        /// Settings file (JSON). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the final order state as CSV to this path
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Print the customer payload that would be sent to the gateway for an order
    Profile {
        order_id: u64,

        #[arg(long)]
        orders: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        user_agent: Option<String>,

        /// Overrides the locale from the settings file
        #[arg(long)]
        locale: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("payrecon=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            deliveries,
            orders,
            config,
            summary,
            db_path,
        } => {
            let settings = load_settings(config.as_deref())?;
            let orders = load_orders(&orders)?;
            let store = order_store(db_path, orders).await?;
            let service = build_service(&settings, store)?;

            replay(&service, &deliveries).await?;

            let orders = service.into_orders().await.into_diagnostic()?;
            if let Some(path) = summary {
                let file = File::create(path).into_diagnostic()?;
                OrderWriter::new(file)
                    .write_orders(orders)
                    .into_diagnostic()?;
            }
        }
        Command::Profile {
            order_id,
            orders,
            config,
            user_agent,
            locale,
        } => {
            let settings = load_settings(config.as_deref())?;
            let store: OrderStoreBox =
                Box::new(InMemoryOrderStore::with_orders(load_orders(&orders)?));
            let context = ClientContext {
                user_agent,
                locale: locale.unwrap_or_else(|| settings.locale.clone()),
            };
            let service = build_service(&settings, store)?;

            let profile = service
                .customer_profile(order_id, context)
                .await
                .into_diagnostic()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&profile).into_diagnostic()?
            );
        }
    }

    Ok(())
}

async fn replay(service: &ReconciliationService, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let reader = DeliveryReader::new(file);

    for delivery in reader.deliveries() {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                eprintln!("Error reading delivery: {}", e);
                continue;
            }
        };

        let outcome = match delivery {
            Delivery::Webhook { transaction } => service
                .handle_webhook(&transaction)
                .await
                .and_then(|result| Ok(serde_json::to_string(&result)?)),
            Delivery::Success { transaction } => service
                .handle_return(&transaction)
                .await
                .and_then(|result| Ok(serde_json::to_string(&result)?)),
            Delivery::Redirect {
                order_id,
                test_mode,
                transaction,
            } => service
                .start_redirect(order_id, transaction.as_ref(), test_mode.as_deref())
                .await
                .and_then(|outcome| Ok(serde_json::to_string(&outcome)?)),
        };

        match outcome {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Error processing delivery: {}", e),
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path).into_diagnostic(),
        None => Ok(Settings::default()),
    }
}

fn load_orders(path: &Path) -> Result<Vec<Order>> {
    let file = File::open(path).into_diagnostic()?;
    read_orders(file).into_diagnostic()
}

fn build_service(settings: &Settings, orders: OrderStoreBox) -> Result<ReconciliationService> {
    let urls = UrlProvider::new(&settings.base_url).into_diagnostic()?;
    let reconciler = OrderReconciler::new(
        orders,
        Box::new(InMemoryNotifier::new()),
        Box::new(InMemoryCommentHistory::new()),
        Box::new(settings.clone()),
        Box::new(InMemoryCheckoutSession::new()),
        urls,
    );
    Ok(ReconciliationService::new(reconciler))
}

#[cfg(feature = "storage-rocksdb")]
async fn order_store(db_path: Option<PathBuf>, orders: Vec<Order>) -> Result<OrderStoreBox> {
    use payrecon::domain::ports::{OrderCriteria, OrderStore};
    use payrecon::infrastructure::rocksdb::RocksDbOrderStore;

    let Some(db_path) = db_path else {
        return Ok(Box::new(InMemoryOrderStore::with_orders(orders)));
    };

    let store = RocksDbOrderStore::open(db_path).into_diagnostic()?;
    // Orders already in the database keep their reconciled state.
    for order in orders {
        let existing = store
            .load(OrderCriteria::ById(order.entity_id))
            .await
            .into_diagnostic()?;
        if existing.is_none() {
            store.save(order).await.into_diagnostic()?;
        }
    }
    Ok(Box::new(store))
}

#[cfg(not(feature = "storage-rocksdb"))]
async fn order_store(db_path: Option<PathBuf>, orders: Vec<Order>) -> Result<OrderStoreBox> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryOrderStore::with_orders(orders)))
}
