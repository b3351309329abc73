use anyhow::{Context, Result};
use clap::Parser;
use housing_board::{
    Config, FilterPatch, IdentityProvider, InMemoryBackend, ListingBackend, ListingEngine,
    ListingSession, OwnerScope, RestBackend, SortKey, WatchIdentity,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Browse apartment listings from the command line
#[derive(Debug, Parser)]
#[command(name = "housing-board", version)]
struct Args {
    /// Matched against title, location and description
    #[arg(short, long, default_value = "")]
    search: String,

    #[arg(long, default_value_t = 0)]
    min_bedrooms: u32,

    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    /// none, price-asc, price-desc, bedrooms-asc or bedrooms-desc
    #[arg(long, default_value = "none")]
    sort: SortKey,

    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Only listings owned by LISTINGS_USER_ID
    #[arg(long)]
    mine: bool,

    /// Write the visible page as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("🏠 Housing Board");

    let identity = WatchIdentity::new(config.user_id.clone());
    let engine = ListingEngine::with_count_policy(config.page_size, config.count_policy);

    match &config.api_url {
        Some(url) => {
            info!("Using listings API at {}", url);
            let backend = RestBackend::new(url.clone(), config.http_timeout)?;
            run(ListingSession::new(backend, identity, engine), &args).await
        }
        None => {
            info!("LISTINGS_API_URL not set, using sample listings");
            let backend = InMemoryBackend::with_sample_listings();
            run(ListingSession::new(backend, identity, engine), &args).await
        }
    }
}

async fn run<B, I>(mut session: ListingSession<B, I>, args: &Args) -> Result<()>
where
    B: ListingBackend,
    I: IdentityProvider,
{
    session.refresh().await.context("Failed to load listings")?;

    let scope = if args.mine {
        OwnerScope::Mine
    } else {
        OwnerScope::All
    };
    session
        .apply_filters(
            FilterPatch::default()
                .search(&args.search)
                .min_bedrooms(args.min_bedrooms)
                .min_price(args.min_price)
                .max_price(args.max_price)
                .scope(scope),
        )
        .await
        .context("Failed to apply filters")?;
    session.change_sort(args.sort);
    session.go_to_page(args.page);

    let view = session.engine().view();
    let offset = (view.pagination.current_page - 1) * view.pagination.page_size;

    if view.is_empty() {
        println!("No listings match the search.");
    }

    for (i, listing) in view.listings.iter().enumerate() {
        let record = &listing.record;
        let price = record
            .price
            .map(|p| format!("${:.0}", p))
            .unwrap_or_else(|| "N/A".to_string());
        println!("{}. {} ({})", offset + i + 1, listing.title.to_markup("*", "*"), price);
        println!("   {}", listing.location.to_markup("*", "*"));
        println!(
            "   {} bedrooms, {} bathrooms",
            record.bedrooms.map_or("N/A".to_string(), |b| b.to_string()),
            record.bathrooms.map_or("N/A".to_string(), |b| b.to_string()),
        );
        if !record.description.is_empty() {
            println!("   {}", listing.description.to_markup("*", "*"));
        }
        println!("   ID: {}", record.id);
        println!("   Image: {}", record.display_image_url());
        println!();
    }

    let pages: Vec<String> = view
        .pagination
        .page_numbers
        .iter()
        .map(|n| {
            if *n == view.pagination.current_page {
                format!("[{}]", n)
            } else {
                n.to_string()
            }
        })
        .collect();
    println!(
        "Page {} of {} ({} listings)  {}",
        view.pagination.current_page,
        view.pagination.total_pages,
        view.pagination.total_count,
        pages.join(" ")
    );

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(view)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved visible page to {}", path.display());
    }

    Ok(())
}
