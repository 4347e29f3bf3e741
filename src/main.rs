use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use storefront::admin::import::{import_images, ImportResult};
use storefront::admin::inventory::inventory_report;
use storefront::media::{
    format_file_size, image_info, resize_image_async, DimensionOverrides, ImageContext, ObjectStore,
};
use storefront::state::data::format_price;
use storefront::state::prefs::PreferenceStore;
use storefront::{CartStore, Config, Library, SessionId};

type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const USAGE: &str = "usage:
  storefront status
  storefront cart
  storefront import-images <folder> <hero|product|category|gallery>
  storefront resize <input> <output> <hero|product|category|gallery>
  storefront info <file>";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    if !config.is_configured() {
        eprintln!("{}", config.notice());
        return ExitCode::FAILURE;
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, args: &[String]) -> AppResult<()> {
    let arg = |i: usize| args.get(i).map(String::as_str);

    match (arg(0), arg(1), arg(2), arg(3)) {
        (None, ..) | (Some("status"), ..) => status(config),
        (Some("cart"), ..) => show_cart(config),
        (Some("import-images"), Some(folder), Some(context), None) => {
            let result = import_folder_async(config, PathBuf::from(folder), context.parse()?).await?;
            println!(
                "Import complete: {} new, {} skipped",
                result.imported_count(),
                result.skipped_count
            );
            Ok(())
        }
        (Some("resize"), Some(input), Some(output), Some(context)) => {
            resize_file(input, output, context.parse()?).await
        }
        (Some("info"), Some(file), None, None) => {
            let bytes = tokio::fs::read(file).await?;
            let info = image_info(&bytes)?;
            println!("{}x{} ({})", info.width, info.height, format_file_size(info.size));
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            Err("unrecognised command".into())
        }
    }
}

fn status(config: &Config) -> AppResult<()> {
    let library = Library::open(config.database_path()?)?;
    let report = inventory_report(&library)?;

    println!("Products:   {}", library.product_count()?);
    println!("Categories: {}", library.list_categories()?.len());
    println!("Orders:     {}", library.list_orders()?.len());

    if !report.low_stock.is_empty() {
        println!();
        println!("Low stock:");
        for product in &report.low_stock {
            println!(
                "  {} ({} left, threshold {})",
                product.name, product.stock_quantity, product.low_stock_threshold
            );
        }
    }
    Ok(())
}

fn show_cart(config: &Config) -> AppResult<()> {
    let library = Library::open(config.database_path()?)?;
    let mut prefs = PreferenceStore::open(config.prefs_path()?)?;
    let session = SessionId::load_or_create(&mut prefs)?;
    let cart = CartStore::open(&library, session)?;

    println!("Session {}", cart.session());
    for item in cart.items() {
        let name = item.product.as_ref().map_or("(removed product)", |p| p.name.as_str());
        println!(
            "  {} x{} [{}]  {}",
            name,
            item.quantity,
            item.size,
            format_price(item.line_total_cents())
        );
    }
    println!("{} item(s), total {}", cart.cart_count(), format_price(cart.cart_total_cents()));
    Ok(())
}

/// Import on the blocking pool with its own connection, since
/// rusqlite::Connection is not Sync
async fn import_folder_async(
    config: &Config,
    folder: PathBuf,
    context: ImageContext,
) -> AppResult<ImportResult> {
    let db_path = config.database_path()?.clone();
    let storage_dir = config.storage_dir()?;
    let public_url = config.public_url()?.to_string();

    let result = tokio::task::spawn_blocking(move || -> AppResult<ImportResult> {
        let library = Library::open(&db_path)?;
        let store = ObjectStore::open(storage_dir, &public_url)?;
        Ok(import_images(&library, &store, &folder, context)?)
    })
    .await??;
    Ok(result)
}

async fn resize_file(input: &str, output: &str, context: ImageContext) -> AppResult<()> {
    let bytes = tokio::fs::read(input).await?;
    let before = bytes.len() as u64;
    let resized =
        resize_image_async(bytes, input.to_string(), context, DimensionOverrides::default()).await?;

    tokio::fs::write(output, &resized.bytes).await?;
    info!("resized {} for {}", input, context);
    println!(
        "{}x{} {} -> {}",
        resized.width,
        resized.height,
        format_file_size(before),
        format_file_size(resized.size())
    );
    Ok(())
}
