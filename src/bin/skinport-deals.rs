//! One-shot discount search.
//!
//! Usage: `skinport-deals [--latest | <snapshot.json>]`
//!
//! Without arguments the listing is fetched live. Thresholds, credentials and
//! the optional SMTP sink are read from the environment (or `.env`).

use std::env;
use std::process::ExitCode;

use skinport_deals::models::format_price;
use skinport_deals::notify::{EmailConfig, EmailNotifier, LogNotifier, NotificationSink};
use skinport_deals::{
    Credentials, DiffStrategy, FilterConfig, Result, SearchOutcome, SearchRequest,
    SkinportClient, SkinportError, SnapshotRef,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skinport_deals=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let SkinportError::Transport { body: Some(body), .. } = &e {
                tracing::debug!(%body, "response body");
            }
            tracing::error!(error = %e, "search failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let filter = filter_from_env()?;

    let mut builder = SkinportClient::builder().credentials(Credentials::from_env());
    if let Ok(dir) = env::var("SKINPORT_DATA_DIR") {
        builder = builder.data_dir(dir);
    }
    if env_flag("SKINPORT_DIFF_BY_NAME") {
        builder = builder.diff_strategy(DiffStrategy::ByName);
    }
    let client = builder.build()?;
    tracing::debug!("{client}");

    let request = match env::args().nth(1).as_deref() {
        Some("--latest") => SearchRequest::saved(SnapshotRef::Latest, filter),
        Some(path) => SearchRequest::saved(SnapshotRef::Path(path.into()), filter),
        None => SearchRequest::live(filter),
    };

    let outcome = client.search(&request)?;
    print_results(&outcome);

    if let Some(keep) = env::var("SKINPORT_KEEP_SNAPSHOTS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
    {
        client.prune_snapshots(keep)?;
    }

    let sink: Box<dyn NotificationSink> = match EmailConfig::from_env() {
        Some(cfg) => Box::new(EmailNotifier::new(cfg)),
        None => Box::new(LogNotifier),
    };
    // The baseline is already saved and `notify` logs the failure, so a
    // failed delivery does not fail the run.
    if client.notify(sink.as_ref(), &outcome).is_err() {
        eprintln!("warning: notification was not delivered, see log for details");
    }
    Ok(())
}

fn filter_from_env() -> Result<FilterConfig> {
    let var = |name: &str, default: &str| env::var(name).unwrap_or_else(|_| default.to_string());

    let mut filter = FilterConfig::from_strings(
        &var("SKINPORT_MIN_DISCOUNT", "10"),
        &var("SKINPORT_MIN_PRICE", "1.00"),
        &var("SKINPORT_CURRENCY", "EUR"),
    )?;
    if let Ok(raw) = env::var("SKINPORT_MAX_PRICE") {
        filter.max_price = raw.trim().parse().map_err(|_| {
            SkinportError::Validation(format!("maximum price must be a number, got {raw:?}"))
        })?;
    }
    filter.knife_only = env_flag("SKINPORT_KNIFE_ONLY");
    filter.glove_only = env_flag("SKINPORT_GLOVE_ONLY");
    filter.exclude_stattrak = env_flag("SKINPORT_EXCLUDE_STATTRAK");
    filter.validate()?;
    Ok(filter)
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn print_results(outcome: &SearchOutcome) {
    let price = |p: Option<f64>| {
        p.map(|v| format_price(v, &outcome.currency))
            .unwrap_or_default()
    };

    println!(
        "{:<60} {:>12} {:>12} {:>10}",
        "Item Name", "Current", "Suggested", "Discount"
    );
    for entry in &outcome.results {
        let marker = if outcome.changes.new_items.contains(entry) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker}{:<59} {:>12} {:>12} {:>9.1}%",
            entry.item.name,
            price(entry.item.min_price),
            price(entry.item.suggested_price),
            entry.discount_percent
        );
    }
    println!(
        "\nFound {} of {} items with discounts ({} new). Snapshot taken {}.",
        outcome.results.len(),
        outcome.snapshot_len,
        outcome.changes.new_items.len(),
        outcome.captured_at.format("%Y-%m-%d %H:%M:%S")
    );
}
