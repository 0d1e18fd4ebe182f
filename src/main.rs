use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datasquare::{explorer_for, DeleteConfig, ExploreConfig, MemoryStore, RowStore};

#[derive(Parser, Debug)]
#[command(name = "datasquare")]
#[command(about = "Explore a personal activity history export", long_about = None)]
struct Args {
    /// JSON export file: an object mapping table names to row arrays
    file: PathBuf,

    /// Table to explore
    #[arg(short, long, default_value = "browsinghistory")]
    table: String,

    /// Table description file (TOML); defaults to the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Free-text query
    #[arg(short, long)]
    query: Option<String>,

    /// Key values to filter on (repeatable)
    #[arg(short, long = "key")]
    keys: Vec<String>,

    /// Start of the date range (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the date range (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Delete the selected rows after printing (no confirmation prompt)
    #[arg(long)]
    delete_selection: bool,

    /// Rows to print from the selection
    #[arg(long, default_value_t = 25)]
    page_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datasquare=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => ExploreConfig::from_toml_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ExploreConfig::default(),
    };

    let store = MemoryStore::new();
    load_export(&store, &config, &args.file)
        .await
        .with_context(|| format!("loading export {}", args.file.display()))?;

    let store: Arc<dyn RowStore> = Arc::new(store);
    let mut explorer = match explorer_for(store, &config, &args.table) {
        Some(explorer) => explorer,
        None => bail!("table '{}' is not described by the config", args.table),
    };
    explorer.refresh_all().await?;

    if let Some(query) = &args.query {
        explorer.set_query(query).await?;
    }
    if !args.keys.is_empty() {
        explorer.set_keys(&args.keys).await?;
    }
    if let Some(from) = args.from {
        explorer.set_start(from).await?;
    }
    if let Some(to) = args.to {
        explorer.set_end(to).await?;
    }

    let stats = explorer.statistics().await?;
    println!("== Statistics ==");
    println!("selected rows:   {}", stats.total);
    if let Some(best) = &stats.best_key {
        println!("top key:         {} ({} rows)", best, stats.best_count);
    }
    println!("distinct keys:   {}", stats.distinct_keys);
    println!("mean per key:    {:.2}", stats.mean_per_key);
    for (table, total) in &stats.table_totals {
        println!("{:16} {}", format!("{table}:"), total);
    }

    let facts = explorer.facts().await?;
    println!("\n== Fun facts ==");
    match facts.modal_weekday {
        Some(day) => println!("most active weekday:  {day}"),
        None => println!("no data"),
    }
    if let Some(start) = facts.typical_start {
        println!("typical start:        {}", start.format("%H:%M"));
    }
    if let Some(end) = facts.typical_end {
        println!("typical end:          {}", end.format("%H:%M"));
    }
    if let Some((day, count)) = facts.busiest_day {
        println!("busiest day:          {day} ({count} rows)");
    }
    println!("longest gap (days):   {}", facts.longest_gap_days);
    if let Some(median) = facts.median_time {
        println!("median time-of-day:   {}", median.format("%H:%M"));
    }

    let calendar = explorer.calendar().await?;
    if let (Some(min), Some(max)) = (calendar.min, calendar.max) {
        println!("\n== Calendar ==");
        println!("span: {min} .. {max} ({} days)", calendar.days.len());
    }

    println!("\n== Rows ==");
    let rows = explorer.page(0, args.page_size).await?;
    let layout = config
        .table(&args.table)
        .map(|t| t.layout.clone())
        .unwrap_or_default();
    for row in &rows {
        let mut cells = vec![row.date.format("%Y-%m-%d %H:%M:%S").to_string()];
        for field in &layout {
            if field == "date" {
                continue;
            }
            if let Some(value) = row.field_str(field) {
                cells.push(value.to_string());
            }
        }
        println!("{:>6}  {}", row.id, cells.join("  "));
    }

    if args.delete_selection {
        let ids = match explorer.selection() {
            datasquare::Selection::All => {
                bail!("refusing to delete with no filter active");
            }
            datasquare::Selection::Ids(ids) => ids.clone(),
        };
        explorer
            .request_delete(ids.clone(), DeleteConfig { confirm: false })
            .await?;
        println!("\ndeleted {} rows", ids.len());
    }

    Ok(())
}

/// Load a JSON export: `{ "<table>": [ { "date": "...", ... }, ... ] }`.
/// Only tables described by the config are loaded.
async fn load_export(
    store: &MemoryStore,
    config: &ExploreConfig,
    path: &PathBuf,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path).await?;
    let export: Value = serde_json::from_str(&raw)?;
    let export = export
        .as_object()
        .context("export root must be an object of table arrays")?;

    for table_config in &config.tables {
        let name = &table_config.table;
        store.create_table(name);
        let rows = match export.get(name).and_then(Value::as_array) {
            Some(rows) => rows,
            None => continue,
        };
        let mut loaded = 0usize;
        for row in rows {
            let mut row = row.clone();
            let date = row
                .as_object_mut()
                .and_then(|obj| obj.remove("date"))
                .context("row missing 'date'")?;
            let date = parse_date(&date)
                .with_context(|| format!("unparseable date in table '{name}'"))?;
            store.insert(name, date, row).await?;
            loaded += 1;
        }
        tracing::info!(table = %name, rows = loaded, "loaded table");
    }
    Ok(())
}

fn parse_date(value: &Value) -> anyhow::Result<NaiveDateTime> {
    let raw = value.as_str().context("'date' must be a string")?;
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(parsed) = day.and_hms_opt(0, 0, 0) {
            return Ok(parsed);
        }
    }
    bail!("unrecognized date '{raw}'")
}
