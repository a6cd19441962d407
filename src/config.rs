//! Shop configuration

use std::path::PathBuf;

use clap::Parser;

/// Shop configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "shopkeep", about = "Inventory and sales ledger for a small shop", long_about = None)]
pub struct ShopConfig {
    /// Catalog file
    #[arg(long, env = "SHOP_INVENTORY_FILE", default_value = "inventory.csv")]
    pub inventory_file: PathBuf,

    /// Sales ledger file
    #[arg(long, env = "SHOP_SALES_FILE", default_value = "sales.csv")]
    pub sales_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

impl ShopConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults_match_working_directory_files() -> TestResult {
        let config = ShopConfig::try_parse_from(["shopkeep"])?;

        assert_eq!(config.inventory_file, PathBuf::from("inventory.csv"));
        assert_eq!(config.sales_file, PathBuf::from("sales.csv"));

        Ok(())
    }

    #[test]
    fn file_locations_can_be_overridden() -> TestResult {
        let config = ShopConfig::try_parse_from([
            "shopkeep",
            "--inventory-file",
            "data/stock.csv",
            "--sales-file",
            "data/ledger.csv",
            "-l",
            "debug",
        ])?;

        assert_eq!(config.inventory_file, PathBuf::from("data/stock.csv"));
        assert_eq!(config.sales_file, PathBuf::from("data/ledger.csv"));
        assert_eq!(config.log_level, "debug");

        Ok(())
    }
}
