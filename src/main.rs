use anyhow::Context;
use clap::Parser;
use housing_analytics::engine::{bedroom_shares, monthly_series, price_series};
use housing_analytics::{
    AnalyticsSession, ClientConfig, CriterionUpdate, HttpTaskService, LoadOutcome, SnapshotLoader,
    TaskId,
};
use serde_json::json;
use std::collections::BTreeSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Load a completed task's analytics and print the filtered chart data
#[derive(Parser, Debug)]
#[command(name = "housing-analytics", version)]
struct Args {
    /// Task to load
    task_id: TaskId,

    /// Base URL of the task service (overrides HOUSING_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Minimum average price
    #[arg(long)]
    min_price: Option<f64>,

    /// Maximum average price
    #[arg(long)]
    max_price: Option<f64>,

    /// Property type to include (repeatable; none means all)
    #[arg(long = "type")]
    property_types: Vec<String>,

    /// Location to include (repeatable; none means all)
    #[arg(long = "location")]
    locations: Vec<String>,

    /// First month to include, YYYY-MM
    #[arg(long)]
    from: Option<String>,

    /// Last month to include, YYYY-MM
    #[arg(long)]
    to: Option<String>,

    /// Minimum bedrooms, 0-5 (5 means 5+)
    #[arg(long, default_value_t = 0)]
    min_bedrooms: u8,

    /// Write the result to this file instead of stdout
    #[arg(long)]
    output: Option<String>,
}

impl Args {
    fn criterion_updates(&self) -> Vec<CriterionUpdate> {
        let mut updates = Vec::new();
        if let Some(v) = self.min_price {
            updates.push(CriterionUpdate::MinPrice(v));
        }
        if let Some(v) = self.max_price {
            updates.push(CriterionUpdate::MaxPrice(v));
        }
        // Selections start empty, so one toggle per distinct label selects it
        for t in self.property_types.iter().collect::<BTreeSet<_>>() {
            updates.push(CriterionUpdate::TogglePropertyType(t.clone()));
        }
        for l in self.locations.iter().collect::<BTreeSet<_>>() {
            updates.push(CriterionUpdate::ToggleLocation(l.clone()));
        }
        if let Some(m) = &self.from {
            updates.push(CriterionUpdate::StartMonth(m.clone()));
        }
        if let Some(m) = &self.to {
            updates.push(CriterionUpdate::EndMonth(m.clone()));
        }
        if self.min_bedrooms > 0 {
            updates.push(CriterionUpdate::MinBedrooms(self.min_bedrooms));
        }
        updates
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &args.api_url {
        config = config.with_base_url(url.clone());
    }
    info!("📊 Housing Analytics - task {} from {}", args.task_id, config.base_url);

    let loader = SnapshotLoader::new(HttpTaskService::with_config(config)?);
    let mut session = AnalyticsSession::new();

    match session.load(&loader, args.task_id).await {
        LoadOutcome::Applied => {}
        LoadOutcome::Failed(message) => {
            warn!("Retry once the task has completed or the service is reachable");
            anyhow::bail!("{}", message);
        }
        LoadOutcome::Stale => anyhow::bail!("load for task {} was superseded", args.task_id),
    }

    for update in args.criterion_updates() {
        session.update(update);
    }

    let current = session
        .current()
        .context("no snapshot loaded after a successful load")?;
    let view = &current.view;

    if view.is_empty() {
        warn!("No data matching the selected filters");
    }

    let report = json!({
        "task_id": current.snapshot.task_id,
        "total_count": current.snapshot.total_count,
        "options": current.options,
        "criteria": current.criteria,
        "view": view,
        "charts": {
            "price_by_type": price_series(&view.avg_price_by_type),
            "price_by_location": price_series(&view.avg_price_by_location),
            "listings_by_month": monthly_series(&view.listings_by_month),
            "bedroom_distribution": bedroom_shares(&view.bedroom_distribution),
        },
    });
    let rendered = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path))?;
            info!("💾 Saved analytics view to {}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
