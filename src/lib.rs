//! Shopkeep
//!
//! Shopkeep is an inventory and sales ledger for a small shop, operated from a text menu.
//! Products and sale lines are kept in memory and mirrored to comma separated files.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod prelude;
pub mod prices;
pub mod products;
pub mod prompt;
mod render;
pub mod sales;
pub mod shop;
pub mod storage;
