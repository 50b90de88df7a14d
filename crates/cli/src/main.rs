use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use loppiskassan_core::models::event::{EventFilter, LoppisEvent};
use loppiskassan_core::models::history::SaleFilter;
use loppiskassan_core::models::sold_item::PaymentMethod;
use loppiskassan_core::storage::codec;
use loppiskassan_core::storage::file_store::DEFAULT_DATA_DIR;
use loppiskassan_core::Loppiskassan;

const LOG_FILE: &str = "loppiskassan.log";

/// Cash register for flea-market vendors.
#[derive(Parser, Debug)]
#[command(name = "loppiskassan", version)]
struct Cli {
    /// Directory holding the ledger and config
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Directory for the log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ring up and check out a sale
    Sell {
        /// Items as SELLER:PRICES, e.g. "12:10 20 30" (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(long, value_enum, default_value = "cash")]
        method: Method,
    },
    /// Show sales history
    History {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Mark a seller's unpaid items as paid out
    Payout {
        #[arg(long)]
        seller: u32,
        #[arg(long, value_enum)]
        method: Option<Method>,
    },
    /// Remove all sales (the ledger is kept as a backup)
    Clear {
        /// Confirm the clear
        #[arg(long)]
        yes: bool,
    },
    /// Copy the ledger into the next backup slot
    Backup,
    /// Merge a ledger exported from another till
    Import {
        file: PathBuf,
        /// The file has no header line
        #[arg(long)]
        no_header: bool,
    },
    /// Write the ledger to a file or stdout
    Export { file: Option<PathBuf> },
    /// List loppis events
    Events {
        #[arg(long)]
        city: Option<String>,
    },
    /// Register this till with an event
    Register {
        #[arg(long)]
        event: String,
        #[arg(long, default_value = "")]
        code: String,
    },
    /// Refresh the approved-seller list
    Sellers,
    /// Upload sales not yet synced
    Upload,
    /// Show settings
    Config,
    /// Set the market share percentage
    MarketShare { percent: u8 },
    /// Switch offline mode on or off
    Offline {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    seller: Option<u32>,
    #[arg(long, value_enum)]
    method: Option<Method>,
    /// Only items paid out to the seller
    #[arg(long, conflicts_with = "unpaid")]
    paid: bool,
    /// Only items not yet paid out
    #[arg(long)]
    unpaid: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> SaleFilter {
        SaleFilter {
            seller: self.seller,
            payment_method: self.method.map(Into::into),
            paid: match (self.paid, self.unpaid) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    Cash,
    Swish,
}

impl From<Method> for PaymentMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Cash => PaymentMethod::Cash,
            Method::Swish => PaymentMethod::Swish,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only path that ends the process early: no place to log or store data.
    init_logging(&cli.log_dir).context("Failed to set up logging")?;
    let mut till = Loppiskassan::open(&cli.data_dir)
        .with_context(|| format!("Failed to open data directory '{}'", cli.data_dir.display()))?;

    run(&mut till, cli.command).await
}

async fn run(till: &mut Loppiskassan, command: Command) -> Result<()> {
    match command {
        Command::Sell { items, method } => {
            for entry in &items {
                let (seller, prices) = entry
                    .split_once(':')
                    .with_context(|| format!("Expected SELLER:PRICES, got '{entry}'"))?;
                till.add_items(seller, prices)?;
            }
            let total = till.pending_total();
            let sold = till
                .checkout(method.into())
                .context("Sale was not saved")?;
            println!("Sold {} items, total {}", sold.len(), till.format_money(total));
        }
        Command::History { filter } => {
            let filter = filter.to_filter();
            let summary = till.history(&filter)?;
            for item in &summary.items {
                let collected = item
                    .collected_by_seller_time
                    .as_ref()
                    .map_or_else(|| codec::NOT_COLLECTED.to_string(), codec::format_timestamp);
                println!(
                    "{}  seller {:>4}  {:>8}  {:<7}  paid out: {}",
                    codec::format_timestamp(&item.sold_time),
                    item.seller,
                    till.format_money(u64::from(item.price)),
                    item.payment_method,
                    collected,
                );
            }
            println!("{} items, total {}", summary.count, till.format_money(summary.total));
            let sellers: Vec<String> = summary.sellers.iter().map(u32::to_string).collect();
            println!("Sellers: {}", sellers.join(", "));
            if filter.seller.is_some() {
                let split = till.settlement(&filter)?;
                println!(
                    "Seller gets {} (market keeps {})",
                    till.format_money(split.net),
                    till.format_money(split.market_share),
                );
            }
            if summary.payout_enabled {
                println!("Unpaid items remain; run `payout` to pay this seller.");
            }
        }
        Command::Payout { seller, method } => {
            let mut filter = SaleFilter::for_seller(seller).with_paid(false);
            filter.payment_method = method.map(Into::into);
            let split = till.settlement(&filter)?;
            let marked = till.payout(&filter).context("Payout was not saved")?;
            println!(
                "Paid out {marked} items to seller {seller}: {}",
                till.format_money(split.net)
            );
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear the history without --yes");
            }
            match till.clear_all()? {
                Some(backup) => println!("History cleared, previous ledger at {}", backup.display()),
                None => println!("History was already empty"),
            }
        }
        Command::Backup => match till.backup()? {
            Some(backup) => println!("Backup written to {}", backup.display()),
            None => println!("Nothing to back up"),
        },
        Command::Import { file, no_header } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read '{}'", file.display()))?;
            let report = till.import_history(&text, !no_header)?;
            println!("Imported {} new items, updated {}", report.added, report.updated);
        }
        Command::Export { file } => {
            let text = till.export_history()?;
            match file {
                Some(path) => fs::write(&path, text)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?,
                None => print!("{text}"),
            }
        }
        Command::Events { city } => {
            let api = till.http_api();
            let filter = EventFilter {
                city,
                ..EventFilter::default()
            };
            for event in till.discover_events(&api, &filter).await {
                println!(
                    "{:<36}  {}  {}",
                    event.id,
                    event.name,
                    event.city.as_deref().unwrap_or("")
                );
            }
        }
        Command::Register { event, code } => {
            let api = till.http_api();
            let event = if event == LoppisEvent::offline().id {
                LoppisEvent::offline()
            } else {
                LoppisEvent {
                    id: event,
                    name: String::new(),
                    description: None,
                    city: None,
                    start_time: None,
                    end_time: None,
                }
            };
            till.register_with_event(&api, &event, &code).await?;
            println!("Registered with event {}", event.id);
        }
        Command::Sellers => {
            let api = till.http_api();
            let sellers = till.refresh_approved_sellers(&api).await?;
            println!("{} approved sellers", sellers.len());
        }
        Command::Upload => {
            let api = till.http_api();
            let uploaded = till.upload_pending(&api).await?;
            println!("Uploaded {uploaded} items");
        }
        Command::Config => {
            let s = till.settings();
            println!("ledger:          {}", till.ledger_path().display());
            println!("event:           {}", s.event_id.as_deref().unwrap_or("-"));
            println!("registered:      {}", s.api_key.is_some());
            println!("offline mode:    {}", s.offline_mode);
            println!("market share:    {}%", s.market_share_percent);
            println!("currency:        {}", s.currency);
            println!("approved:        {}", s.approved_sellers.len());
        }
        Command::MarketShare { percent } => {
            let mut settings = till.settings().clone();
            settings.market_share_percent = percent;
            till.update_settings(settings)?;
        }
        Command::Offline { enabled } => {
            let mut settings = till.settings().clone();
            settings.offline_mode = enabled;
            till.update_settings(settings)?;
        }
    }
    Ok(())
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Cannot create log directory '{}'", log_dir.display()))?;
    let path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Cannot open log file '{}'", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
