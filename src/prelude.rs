//! Shopkeep prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, CatalogError},
    config::ShopConfig,
    ledger::{Ledger, LedgerError, PendingSale, SaleError, SaleOutcome},
    prices::{Price, PriceError},
    products::{Product, ProductKey},
    prompt::Prompt,
    sales::SaleLine,
    shop::{MenuChoice, Shop, ShopError},
    storage::{LoadReport, StorageError},
};
