use crate::interfaces::http::state::Limits;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shipping quotes, payments and order reconciliation", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

/// Runtime settings. Every flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Address the HTTP service binds to
    #[arg(long, env = "TRANSDOM_LISTEN", default_value = "0.0.0.0:3000", global = true)]
    pub listen: SocketAddr,

    /// Base URL of the order/rate backend
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000", global = true)]
    pub api_base_url: String,

    /// Base URL of the payment gateway
    #[arg(long, env = "PAYSTACK_API_URL", default_value = "https://api.paystack.co", global = true)]
    pub gateway_url: String,

    /// Gateway secret key, also used to check webhook signatures
    #[arg(long, env = "PAYSTACK_SECRET_KEY", hide_env_values = true, global = true)]
    pub gateway_secret: Option<String>,

    /// Where the gateway sends the customer after paying
    #[arg(
        long,
        env = "PAYMENT_CALLBACK_URL",
        default_value = "http://localhost:3000/payment/success",
        global = true
    )]
    pub callback_url: String,

    /// Prefix of generated payment references
    #[arg(long, env = "PAYMENT_REFERENCE_PREFIX", default_value = "TDL", global = true)]
    pub reference_prefix: String,

    /// Timeout applied to every upstream call
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 15, global = true)]
    pub upstream_timeout_secs: u64,

    /// Directory holding zones.csv and countries.csv, replacing the built-in table
    #[arg(long, env = "TRANSDOM_ZONES_DIR", global = true)]
    pub zones_dir: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "TRANSDOM_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Hours an untouched in-memory draft is kept
    #[arg(long, env = "TRANSDOM_DRAFT_TTL_HOURS", default_value_t = 72, global = true)]
    pub draft_ttl_hours: u32,

    /// Hours a finished payment reference is remembered by the order guard
    #[arg(long, env = "TRANSDOM_ORDER_RETENTION_HOURS", default_value_t = 24, global = true)]
    pub order_retention_hours: u32,

    /// Webhook confirmations kept before the oldest are forgotten
    #[arg(long, env = "TRANSDOM_WEBHOOK_CAPACITY", default_value_t = 10_000, global = true)]
    pub webhook_capacity: usize,

    /// Emit logs as JSON lines
    #[arg(long, env = "TRANSDOM_LOG_JSON", global = true)]
    pub log_json: bool,
}

const HOUR: u64 = 60 * 60;

impl Config {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }

    pub fn draft_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.draft_ttl_hours.max(1)))
    }

    pub fn limits(&self) -> Limits {
        Limits {
            order_retention: Duration::from_secs(u64::from(self.order_retention_hours.max(1)) * HOUR),
            webhook_capacity: self.webhook_capacity.max(1),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve,
    /// Print the zone a destination country ships to
    Zone {
        country: String,
    },
    /// Print the zone table as CSV
    Zones,
    /// Price one shipment against the configured rate service
    Quote {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Weight in kilograms
        #[arg(long)]
        weight: Decimal,
    },
    /// Inspect or clear a session's cached draft
    Drafts {
        #[command(subcommand)]
        action: DraftsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftsAction {
    Show { session: String },
    Clear { session: String },
}
