// Rust guideline compliant 2026-10-12

//! Coupon validation entry point.
//!
//! Wires the redemption engine to its adapters and exposes it as a CLI.
//! Without `--db-url` the built-in demo catalog answers lookups and scan
//! attempts only go to the log; with it, a SQLite file serves both ports.
//!
//! # Usage
//!
//! ```text
//! # Validate one payload against the demo catalog
//! cargo run -- scan "https://cupones.example/v?id=115a13c3-bb80-4cd3-8a8f-3afcf5fb7584" \
//!     --lat -17.3930 --lng -66.1572 --at "2026-10-18 10:00"
//!
//! # Same against a SQLite store, JSON output
//! cargo run -- --db-url sqlite:coupons.db seed
//! cargo run -- --db-url sqlite:coupons.db scan EXPIRED-001 --json
//! cargo run -- --db-url sqlite:coupons.db history --limit 20
//!
//! # Scripted walk through every status
//! RUST_LOG=debug cargo run -- demo
//! ```

mod adapters;

use adapters::in_memory_catalog::{DEMO_STORE, InMemoryCatalog, demo_promotions};
use adapters::log_scan_log::LogScanLog;
use adapters::sqlite_store::SqliteStore;
use anyhow::Context as _;
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use domain::{Coordinate, Outcome, PromotionLookup, ScanLog, ScanRequest, Validation};
use redemption::{Validator, ValidatorConfig};
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "coupon_validation",
    about = "Decide whether a scanned coupon can be redeemed right now",
    version
)]
struct Cli {
    /// SQLite database holding promotions and the scan log
    #[arg(long, global = true, env = "COUPON_DB_URL")]
    db_url: Option<String>,
    /// Geofence radius around the store, in metres
    #[arg(long, global = true, env = "COUPON_RADIUS_M", default_value_t = redemption::geofence::DEFAULT_RADIUS_M)]
    radius_m: f64,
    /// Give up on a promotion lookup after this many milliseconds
    #[arg(long, global = true, env = "COUPON_LOOKUP_TIMEOUT_MS")]
    lookup_timeout_ms: Option<u64>,
    /// Drop a scan-log write that takes longer than this many milliseconds
    #[arg(long, global = true, env = "COUPON_SCAN_LOG_TIMEOUT_MS")]
    scan_log_timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one scanned payload
    Scan(ScanArgs),
    /// Write the demo promotions into the SQLite store
    Seed,
    /// List recent scan attempts from the SQLite store
    History(HistoryArgs),
    /// Run scripted scans covering every status against the demo catalog
    Demo,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Raw QR payload: a promotion id or a link carrying one
    payload: String,
    /// Device latitude in decimal degrees
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Device longitude in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,
    /// Local scan time (YYYY-MM-DD HH:MM[:SS]); defaults to now
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<NaiveDateTime>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// Maximum number of entries to print
    #[arg(long, default_value_t = 50)]
    limit: u32,
}

/// Wire shape of a scan result; only a valid scan carries title and image.
#[derive(Debug, Serialize)]
struct ScanResponse<'a> {
    status: u8,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

impl<'a> From<&'a Validation> for ScanResponse<'a> {
    fn from(validation: &'a Validation) -> Self {
        let (title, image_url) = match &validation.outcome {
            Outcome::Valid { title, image_reference } => {
                (Some(title.as_str()), Some(image_reference.as_str()))
            }
            _ => (None, None),
        };
        Self {
            status: validation.status().code(),
            message: &validation.message,
            title,
            image_url,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        return Err(e).context("failed to load .env");
    }

    let cli = Cli::parse();

    // Logs go to stderr so that `scan --json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = ValidatorConfig::builder().radius_m(cli.radius_m);
    if let Some(ms) = cli.lookup_timeout_ms {
        config = config.lookup_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli.scan_log_timeout_ms {
        config = config.scan_log_timeout(Duration::from_millis(ms));
    }
    let validator = Validator::new(config.build().context("failed to build validator config")?);
    let active = validator.config();
    tracing::debug!(
        radius_m = active.radius_m,
        lookup_timeout = ?active.lookup_timeout,
        scan_log_timeout = ?active.scan_log_timeout,
        "main.config"
    );

    match cli.command {
        Command::Scan(args) => match cli.db_url.as_deref() {
            Some(url) => {
                let store = open_store(Some(url)).await?;
                run_scan(&validator, &store, &store, args).await
            }
            None => {
                tracing::info!("main.scan: no --db-url, using demo catalog");
                run_scan(&validator, &InMemoryCatalog::demo(), &LogScanLog::new(), args).await
            }
        },
        Command::Seed => {
            let store = open_store(cli.db_url.as_deref()).await?;
            let promotions = demo_promotions();
            for record in &promotions {
                store
                    .upsert_promotion(record)
                    .await
                    .with_context(|| format!("failed to write promotion {}", record.id))?;
            }
            println!("seeded {} promotions", promotions.len());
            Ok(())
        }
        Command::History(args) => {
            let store = open_existing_store(cli.db_url.as_deref()).await?;
            print_history(&store, args.limit).await
        }
        Command::Demo => {
            for (label, validation) in run_demo(&validator, Local::now().date_naive()).await {
                println!("\n-- {label}");
                print_validation(&validation);
            }
            Ok(())
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD HH:MM[:SS] ({err})"))
}

async fn open_store(db_url: Option<&str>) -> anyhow::Result<SqliteStore> {
    let url = db_url.context("this command needs --db-url or COUPON_DB_URL")?;
    SqliteStore::new(url)
        .await
        .with_context(|| format!("failed to open SQLite store at {url}"))
}

/// Like [`open_store`], but refuses to create a database that is not there yet.
async fn open_existing_store(db_url: Option<&str>) -> anyhow::Result<SqliteStore> {
    let url = db_url.context("this command needs --db-url or COUPON_DB_URL")?;
    SqliteStore::open_existing(url)
        .await
        .with_context(|| format!("no readable SQLite store at {url} (run `seed` or `scan` first)"))
}

async fn run_scan<L, S>(
    validator: &Validator,
    lookup: &L,
    scan_log: &S,
    args: ScanArgs,
) -> anyhow::Result<()>
where
    L: PromotionLookup,
    S: ScanLog,
{
    let validation = scan_once(validator, lookup, scan_log, &args).await;

    if args.json {
        let body = serde_json::to_string_pretty(&ScanResponse::from(&validation))
            .context("failed to encode scan result")?;
        println!("{body}");
    } else {
        print_validation(&validation);
    }
    Ok(())
}

async fn scan_once<L, S>(
    validator: &Validator,
    lookup: &L,
    scan_log: &S,
    args: &ScanArgs,
) -> Validation
where
    L: PromotionLookup,
    S: ScanLog,
{
    let request = ScanRequest {
        payload: args.payload.clone(),
        location: args.lat.zip(args.lng).map(|(lat, lng)| Coordinate::new(lat, lng)),
        now: args.at.unwrap_or_else(|| Local::now().naive_local()),
    };
    validator.validate(lookup, scan_log, &request).await
}

fn print_validation(validation: &Validation) {
    let status = validation.status();
    println!("[{} {}] {}", status.code(), status, validation.message);
    if let Outcome::Valid { title, image_reference } = &validation.outcome {
        println!("  title: {title}");
        println!("  image: {image_reference}");
    }
}

async fn print_history(store: &SqliteStore, limit: u32) -> anyhow::Result<()> {
    let entries = store
        .recent_scans(limit)
        .await
        .context("failed to read scan history")?;

    if entries.is_empty() {
        println!("no scans recorded");
        return Ok(());
    }

    for entry in entries {
        let status = entry.status.map_or("?", |s| s.label());
        let title = entry.title.as_deref().unwrap_or("-");
        let mark = if entry.status == Some(domain::Status::Valid) { "ok " } else { "err" };
        println!(
            "{} | {mark} | {status:<12} | {title} ({}) | {}",
            entry.scanned_at, entry.promotion_id, entry.reason
        );
    }
    Ok(())
}

/// One scripted scan for `demo`.
struct DemoScan {
    label: &'static str,
    payload: &'static str,
    location: Option<Coordinate>,
    hour: u32,
}

fn demo_scans() -> [DemoScan; 9] {
    let nearby = Coordinate::new(DEMO_STORE.latitude + 0.0005, DEMO_STORE.longitude - 0.0002);
    let far_away = Coordinate::new(DEMO_STORE.latitude + 0.045, DEMO_STORE.longitude);

    [
        DemoScan {
            label: "link near the store at 10:00",
            payload: "https://cupones.example/v?id=115a13c3-bb80-4cd3-8a8f-3afcf5fb7584",
            location: Some(nearby),
            hour: 10,
        },
        DemoScan {
            label: "same coupon again",
            payload: "115a13c3-bb80-4cd3-8a8f-3afcf5fb7584",
            location: Some(nearby),
            hour: 10,
        },
        DemoScan {
            label: "5 km away",
            payload: "https://cupones.example/c/115a13c3-bb80-4cd3-8a8f-3afcf5fb7584",
            location: Some(far_away),
            hour: 10,
        },
        DemoScan {
            label: "no GPS fix",
            payload: "115a13c3-bb80-4cd3-8a8f-3afcf5fb7584",
            location: None,
            hour: 10,
        },
        DemoScan {
            label: "after closing time",
            payload: "115a13c3-bb80-4cd3-8a8f-3afcf5fb7584",
            location: Some(far_away),
            hour: 23,
        },
        DemoScan {
            label: "past its validity date",
            payload: "EXPIRED-001",
            location: Some(nearby),
            hour: 10,
        },
        DemoScan {
            label: "hours never configured",
            payload: "NOHOURS-001",
            location: Some(nearby),
            hour: 10,
        },
        DemoScan {
            label: "unknown coupon",
            payload: "https://cupones.example/v?id=DOES-NOT-EXIST",
            location: Some(nearby),
            hour: 10,
        },
        DemoScan { label: "blank QR", payload: "   ", location: Some(nearby), hour: 10 },
    ]
}

/// Run the scripted scans on `today` against the demo catalog.
async fn run_demo(validator: &Validator, today: NaiveDate) -> Vec<(&'static str, Validation)> {
    let catalog = InMemoryCatalog::demo();
    let scan_log = LogScanLog::new();
    let mut results = Vec::new();

    for scan in demo_scans() {
        let Some(now) = today.and_hms_opt(scan.hour, 0, 0) else {
            continue;
        };
        let request = ScanRequest {
            payload: scan.payload.to_owned(),
            location: scan.location,
            now,
        };
        results.push((scan.label, validator.validate(&catalog, &scan_log, &request).await));
    }
    results
}
