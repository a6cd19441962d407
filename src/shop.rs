//! Shop
//!
//! The menu loop that ties the catalog and the ledger together.

use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    catalog::{Catalog, CatalogError},
    config::ShopConfig,
    ledger::{Ledger, LedgerError, SaleOutcome},
    prices::Price,
    products::Product,
    prompt::Prompt,
    storage::{LoadReport, StorageError},
};

/// Menu shown before every choice.
pub const MENU: &str = "
--- Small Shop Management System ---
1. View Inventory
2. Add Product
3. Process Sale
4. View Sales
5. Exit";

/// Errors that end a shop session.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Operator input or output failed.
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    /// A backing file could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The catalog could not be updated.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A sale could not be completed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// The selection was not one of the menu options.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid choice! Please enter a valid option.")]
pub struct InvalidChoice(pub String);

/// The price or quantity of a new product could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid input! Please enter valid numbers for price and quantity.")]
pub struct InvalidInput(pub String);

/// Menu options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Show the catalog
    ViewInventory,

    /// Add a product to the catalog
    AddProduct,

    /// Record a sale
    ProcessSale,

    /// Show the ledger
    ViewSales,

    /// End the session
    Exit,
}

impl FromStr for MenuChoice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::ViewInventory),
            "2" => Ok(MenuChoice::AddProduct),
            "3" => Ok(MenuChoice::ProcessSale),
            "4" => Ok(MenuChoice::ViewSales),
            "5" => Ok(MenuChoice::Exit),
            _ => Err(InvalidChoice(s.to_string())),
        }
    }
}

/// Parses the price of a new product.
///
/// # Errors
///
/// Returns [`InvalidInput`] unless the input is a non-negative decimal.
pub fn parse_price(raw: &str) -> Result<Price, InvalidInput> {
    raw.parse::<Price>().map_err(|error| {
        debug!(%error, "rejected price");

        InvalidInput(raw.to_string())
    })
}

/// Parses the stock quantity of a new product.
///
/// # Errors
///
/// Returns [`InvalidInput`] unless the input is a non-negative integer.
pub fn parse_stock(raw: &str) -> Result<u32, InvalidInput> {
    raw.trim().parse::<u32>().map_err(|error| {
        debug!(%error, "rejected quantity");

        InvalidInput(raw.to_string())
    })
}

/// Whether the session goes on after a menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Catalog and ledger for one session.
#[derive(Debug)]
pub struct Shop {
    catalog: Catalog,
    ledger: Ledger,
}

impl Shop {
    /// Create a new shop from already opened stores.
    pub fn new(catalog: Catalog, ledger: Ledger) -> Self {
        Shop { catalog, ledger }
    }

    /// Opens the stores named by `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if either file cannot be read or holds unparsable
    /// values.
    pub fn open(config: &ShopConfig) -> Result<Self, StorageError> {
        let (catalog, catalog_report) = Catalog::open(&config.inventory_file)?;
        report_load("catalog", &catalog_report);

        let (ledger, ledger_report) = Ledger::open(&config.sales_file)?;
        report_load("ledger", &ledger_report);

        Ok(Shop::new(catalog, ledger))
    }

    /// Product catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Sales ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Runs the menu loop until the operator exits or the input ends.
    ///
    /// # Errors
    ///
    /// Returns a [`ShopError`] if the terminal fails or a file cannot be written.
    pub fn run<R: BufRead, W: Write>(&mut self, prompt: &mut Prompt<R, W>) -> Result<(), ShopError> {
        loop {
            prompt.say(MENU)?;

            let Some(answer) = prompt.ask("Enter your choice: ")? else {
                info!("input closed, ending session");

                return Ok(());
            };

            let flow = match answer.parse::<MenuChoice>() {
                Ok(choice) => self.dispatch(choice, prompt)?,
                Err(error) => {
                    debug!(choice = %error.0, "rejected menu choice");
                    prompt.say(error)?;

                    Flow::Continue
                }
            };

            if flow == Flow::Stop {
                return Ok(());
            }
        }
    }

    fn dispatch<R: BufRead, W: Write>(
        &mut self,
        choice: MenuChoice,
        prompt: &mut Prompt<R, W>,
    ) -> Result<Flow, ShopError> {
        match choice {
            MenuChoice::ViewInventory => self.catalog.write_to(prompt.output())?,
            MenuChoice::AddProduct => return self.add_product(prompt),
            MenuChoice::ProcessSale => {
                if self.ledger.process_sale(&mut self.catalog, prompt)? == SaleOutcome::Abandoned {
                    return Ok(Flow::Stop);
                }
            }
            MenuChoice::ViewSales => self.ledger.write_to(prompt.output())?,
            MenuChoice::Exit => {
                prompt.say("Exiting... Thank you!")?;

                return Ok(Flow::Stop);
            }
        }

        Ok(Flow::Continue)
    }

    fn add_product<R: BufRead, W: Write>(
        &mut self,
        prompt: &mut Prompt<R, W>,
    ) -> Result<Flow, ShopError> {
        let Some(id) = prompt.ask("Enter Product ID: ")? else {
            return Ok(Flow::Stop);
        };

        let Some(name) = prompt.ask("Enter Product Name: ")? else {
            return Ok(Flow::Stop);
        };

        let Some(raw_price) = prompt.ask("Enter Price: ")? else {
            return Ok(Flow::Stop);
        };

        let price = match parse_price(&raw_price) {
            Ok(price) => price,
            Err(error) => {
                prompt.say(error)?;

                return Ok(Flow::Continue);
            }
        };

        let Some(raw_quantity) = prompt.ask("Enter Quantity: ")? else {
            return Ok(Flow::Stop);
        };

        let quantity = match parse_stock(&raw_quantity) {
            Ok(quantity) => quantity,
            Err(error) => {
                prompt.say(error)?;

                return Ok(Flow::Continue);
            }
        };

        match self
            .catalog
            .add_product(Product::new(id, name, price, quantity))
        {
            Ok(_key) => prompt.say("Product added successfully!")?,
            Err(error @ CatalogError::DuplicateKey(_)) => {
                debug!(%error, "rejected product");
                prompt.say(error)?;
            }
            Err(error) => return Err(error.into()),
        }

        Ok(Flow::Continue)
    }
}

fn report_load(store: &str, report: &LoadReport) {
    if report.skipped > 0 {
        warn!(
            store,
            skipped = report.skipped,
            loaded = report.loaded,
            "skipped malformed rows"
        );
    } else {
        debug!(store, loaded = report.loaded, created = report.created, "loaded");
    }
}
