//! Shopkeep
//!
//! Interactive inventory and sales menu for a small shop.

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopkeep::{config::ShopConfig, prompt::Prompt, shop::Shop};

pub fn main() -> Result<()> {
    let config = ShopConfig::load().unwrap_or_else(|error| error.exit());

    // Menu output owns stdout, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_err| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut shop = Shop::open(&config)?;

    info!(
        inventory = %config.inventory_file.display(),
        sales = %config.sales_file.display(),
        "shop opened"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut prompt = Prompt::new(stdin.lock(), stdout.lock());

    shop.run(&mut prompt)?;

    Ok(())
}
