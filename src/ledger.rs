//! Sales ledger
//!
//! The ledger is the append-only record of sale lines, mirrored to a tabular file. Sales
//! are built up as a [`PendingSale`] that takes stock from the catalog line by line and
//! is committed to the ledger once the operator finishes entering items.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, CatalogError},
    prices::{Price, PriceError},
    products::ProductKey,
    prompt::Prompt,
    render,
    sales::SaleLine,
    storage::{self, LoadReport, StorageError},
};

/// Header row of the ledger file.
pub const LEDGER_HEADER: [&str; 5] = [
    "Sale ID",
    "Product ID",
    "Product Name",
    "Quantity Sold",
    "Total Price",
];

/// Answer that ends item entry, compared case-insensitively.
pub const DONE: &str = "done";

/// Reasons a line cannot be added to a sale.
#[derive(Debug, Error)]
pub enum SaleError {
    /// No product has this ID.
    #[error("Invalid Product ID!")]
    InvalidProductId(String),

    /// The quantity is not a positive whole number.
    #[error("Invalid quantity! Please enter a valid number.")]
    InvalidQuantity(String),

    /// More units were requested than are in stock.
    #[error("Insufficient stock!")]
    InsufficientStock {
        /// Product ID
        product_id: String,
        /// Units requested
        requested: u32,
        /// Units in stock
        available: u32,
    },

    /// The line total does not fit in a price.
    #[error("Total price out of range!")]
    Price(#[from] PriceError),

    /// The catalog rejected the stock adjustment.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors that end a sale workflow.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Operator input or output failed.
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    /// A backing file could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The catalog rejected a stock adjustment.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// How an interactive sale ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOutcome {
    /// The sale was recorded with this many lines.
    Recorded(usize),

    /// Input ended before the sale was finished; nothing was recorded.
    Abandoned,
}

/// Parses an operator supplied quantity to sell.
///
/// # Errors
///
/// Returns [`SaleError::InvalidQuantity`] unless the input is a positive integer.
pub fn parse_quantity(raw: &str) -> Result<u32, SaleError> {
    match raw.trim().parse::<u32>() {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(SaleError::InvalidQuantity(raw.to_string())),
    }
}

/// A sale whose lines have taken stock from the catalog but are not yet recorded.
#[derive(Debug)]
pub struct PendingSale {
    sale_id: String,
    lines: SmallVec<[SaleLine; 4]>,
    taken: SmallVec<[(ProductKey, u32); 4]>,
}

impl PendingSale {
    /// Starts a sale with the given identifier.
    pub fn new(sale_id: impl Into<String>) -> Self {
        PendingSale {
            sale_id: sale_id.into(),
            lines: SmallVec::new(),
            taken: SmallVec::new(),
        }
    }

    /// Adds a line selling `quantity` units of `product_id` and takes them from stock.
    ///
    /// Returns the line total. The catalog change is not persisted.
    ///
    /// # Errors
    ///
    /// Returns a [`SaleError`] if the product is unknown, the quantity is zero or exceeds
    /// the stock left, or the total is out of range. The sale and catalog are unchanged
    /// on error.
    pub fn add_line(
        &mut self,
        catalog: &mut Catalog,
        product_id: &str,
        quantity: u32,
    ) -> Result<Price, SaleError> {
        let (key, product) = catalog
            .key(product_id)
            .and_then(|key| catalog.product(key).map(|product| (key, product)))
            .ok_or_else(|| SaleError::InvalidProductId(product_id.to_string()))?;

        if quantity == 0 {
            return Err(SaleError::InvalidQuantity(quantity.to_string()));
        }

        if !product.has_stock(quantity) {
            return Err(SaleError::InsufficientStock {
                product_id: product.id.clone(),
                requested: quantity,
                available: product.quantity,
            });
        }

        let total = product.price.times(quantity)?;
        let line = SaleLine::new(
            self.sale_id.clone(),
            product.id.clone(),
            product.name.clone(),
            quantity,
            total,
        );

        catalog.adjust_quantity(key, -i64::from(quantity))?;

        self.lines.push(line);
        self.taken.push((key, quantity));

        Ok(total)
    }

    /// Returns the stock taken by this sale to the catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a quantity cannot be restored.
    pub fn abandon(self, catalog: &mut Catalog) -> Result<(), CatalogError> {
        for (key, quantity) in self.taken {
            catalog.adjust_quantity(key, i64::from(quantity))?;
        }

        info!(sale = %self.sale_id, lines = self.lines.len(), "abandoned sale");

        Ok(())
    }

    /// Sale identifier.
    pub fn sale_id(&self) -> &str {
        &self.sale_id
    }

    /// Lines added so far.
    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    /// Number of lines added so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines have been added.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// File-backed, append-only list of sale lines.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    lines: Vec<SaleLine>,
}

impl Ledger {
    /// Opens the ledger stored at `path`, creating an empty file if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file cannot be read or holds an unparsable
    /// quantity or total.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, LoadReport), StorageError> {
        let path = path.into();
        let rows = storage::read_rows(&path, LEDGER_HEADER.len())?;

        let lines = rows
            .records
            .iter()
            .map(|record| -> Result<SaleLine, StorageError> {
                Ok(SaleLine::new(
                    storage::text(record, 0),
                    storage::text(record, 1),
                    storage::text(record, 2),
                    storage::parse(&path, record, 3, "Quantity Sold")?,
                    storage::parse(&path, record, 4, "Total Price")?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let report = LoadReport {
            loaded: lines.len(),
            ..rows.report
        };

        debug!(path = %path.display(), ?report, "opened ledger");

        Ok((Ledger { path, lines }, report))
    }

    /// Records a pending sale, then persists the ledger and the catalog.
    ///
    /// Returns the number of lines recorded.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if either file cannot be written.
    pub fn commit(&mut self, sale: PendingSale, catalog: &Catalog) -> Result<usize, StorageError> {
        let PendingSale { sale_id, lines, .. } = sale;
        let recorded = lines.len();

        self.lines.extend(lines);
        self.persist()?;
        catalog.persist()?;

        info!(sale = %sale_id, lines = recorded, "recorded sale");

        Ok(recorded)
    }

    /// Runs the interactive sale workflow.
    ///
    /// Asks for a sale ID, then for products and quantities until the operator answers
    /// [`DONE`]. Rejected lines are reported and dropped without ending the sale. If the
    /// input ends early, the stock taken is returned and nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the terminal fails or the files cannot be written.
    pub fn process_sale<R: BufRead, W: Write>(
        &mut self,
        catalog: &mut Catalog,
        prompt: &mut Prompt<R, W>,
    ) -> Result<SaleOutcome, LedgerError> {
        let Some(sale_id) = prompt.ask("Enter Sale ID: ")? else {
            return Ok(SaleOutcome::Abandoned);
        };

        let mut sale = PendingSale::new(sale_id);

        let finished = match collect_lines(&mut sale, catalog, prompt) {
            Ok(finished) => finished,
            Err(error) => {
                sale.abandon(catalog)?;

                return Err(error);
            }
        };

        if !finished {
            sale.abandon(catalog)?;

            return Ok(SaleOutcome::Abandoned);
        }

        let recorded = self.commit(sale, catalog)?;

        prompt.say("Sale recorded successfully!")?;

        Ok(SaleOutcome::Recorded(recorded))
    }

    /// Rewrites the ledger file from memory.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file cannot be written.
    pub fn persist(&self) -> Result<(), StorageError> {
        storage::write_rows(&self.path, &LEDGER_HEADER, self.lines.iter())
    }

    /// Iterate over the recorded lines in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &SaleLine> {
        self.lines.iter()
    }

    /// Number of recorded lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines have been recorded.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the ledger as a table, or a notice when it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        if self.is_empty() {
            return writeln!(out, "No sales recorded yet!");
        }

        let table = render::grid(
            LEDGER_HEADER,
            self.iter().map(|line| {
                [
                    line.sale_id.clone(),
                    line.product_id.clone(),
                    line.product_name.clone(),
                    line.quantity_sold.to_string(),
                    line.total_price.to_string(),
                ]
            }),
            3..5,
        );

        writeln!(out, "{table}")
    }
}

/// Prompts for items until the operator is done. Returns `false` if input ran out.
fn collect_lines<R: BufRead, W: Write>(
    sale: &mut PendingSale,
    catalog: &mut Catalog,
    prompt: &mut Prompt<R, W>,
) -> Result<bool, LedgerError> {
    loop {
        let Some(product_id) = prompt.ask("Enter Product ID to sell (or 'done' to finish): ")?
        else {
            return Ok(false);
        };

        if product_id.trim().eq_ignore_ascii_case(DONE) {
            return Ok(true);
        }

        let Some(name) = catalog.get(&product_id).map(|product| product.name.clone()) else {
            debug!(product = %product_id, "rejected sale line: unknown product");
            prompt.say(SaleError::InvalidProductId(product_id))?;

            continue;
        };

        let Some(raw) = prompt.ask(&format!("Enter quantity for {name}: "))? else {
            return Ok(false);
        };

        let added = match parse_quantity(&raw) {
            Ok(quantity) => sale.add_line(catalog, &product_id, quantity),
            Err(error) => Err(error),
        };

        match added {
            Ok(total) => {
                debug!(sale = %sale.sale_id(), product = %product_id, %total, "added sale line");
            }
            Err(SaleError::Catalog(error)) => return Err(error.into()),
            Err(error) => {
                debug!(sale = %sale.sale_id(), product = %product_id, ?error, "rejected sale line");
                prompt.say(error)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::{TempDir, tempdir};
    use testresult::TestResult;

    use crate::products::Product;

    use super::*;

    fn stores(dir: &TempDir, stock: u32) -> TestResult<(Catalog, Ledger)> {
        let (mut catalog, _report) = Catalog::open(dir.path().join("inventory.csv"))?;
        let (ledger, _report) = Ledger::open(dir.path().join("sales.csv"))?;

        catalog.add_product(Product::new("P1", "Widget", "9.99".parse()?, stock))?;
        catalog.add_product(Product::new("P2", "Gadget", "2.50".parse()?, 4))?;

        Ok((catalog, ledger))
    }

    fn quantity(catalog: &Catalog, id: &str) -> Option<u32> {
        catalog.get(id).map(|product| product.quantity)
    }

    fn run_sale(
        ledger: &mut Ledger,
        catalog: &mut Catalog,
        input: &str,
    ) -> TestResult<(SaleOutcome, String)> {
        let mut prompt = Prompt::new(input.as_bytes(), Vec::new());
        let outcome = ledger.process_sale(catalog, &mut prompt)?;

        Ok((outcome, String::from_utf8(prompt.into_output())?))
    }

    #[test]
    fn parse_quantity_requires_a_positive_integer() {
        assert!(matches!(parse_quantity(" 3 "), Ok(3)));
        assert!(matches!(
            parse_quantity("0"),
            Err(SaleError::InvalidQuantity(_))
        ));
        assert!(matches!(
            parse_quantity("-2"),
            Err(SaleError::InvalidQuantity(_))
        ));
        assert!(matches!(
            parse_quantity("two"),
            Err(SaleError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn add_line_snapshots_product_and_takes_stock() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, _ledger) = stores(&dir, 10)?;
        let mut sale = PendingSale::new("S1");

        let total = sale.add_line(&mut catalog, "P1", 3)?;

        assert_eq!(total.to_string(), "29.97");
        assert_eq!(
            sale.lines(),
            [SaleLine::new("S1", "P1", "Widget", 3, "29.97".parse()?)]
        );
        assert_eq!(quantity(&catalog, "P1"), Some(7));

        Ok(())
    }

    #[test]
    fn later_lines_see_stock_taken_by_earlier_ones() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, _ledger) = stores(&dir, 5)?;
        let mut sale = PendingSale::new("S1");

        sale.add_line(&mut catalog, "P1", 4)?;

        let result = sale.add_line(&mut catalog, "P1", 2);

        assert!(matches!(
            result,
            Err(SaleError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            })
        ));
        assert_eq!(sale.len(), 1);
        assert_eq!(quantity(&catalog, "P1"), Some(1));

        Ok(())
    }

    #[test]
    fn add_line_rejects_unknown_products_and_zero_quantities() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, _ledger) = stores(&dir, 5)?;
        let mut sale = PendingSale::new("S1");

        assert!(matches!(
            sale.add_line(&mut catalog, "P9", 1),
            Err(SaleError::InvalidProductId(_))
        ));
        assert!(matches!(
            sale.add_line(&mut catalog, "P1", 0),
            Err(SaleError::InvalidQuantity(_))
        ));
        assert!(sale.is_empty());
        assert_eq!(quantity(&catalog, "P1"), Some(5));

        Ok(())
    }

    #[test]
    fn abandon_returns_stock() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, _ledger) = stores(&dir, 10)?;
        let mut sale = PendingSale::new("S1");

        sale.add_line(&mut catalog, "P1", 3)?;
        sale.add_line(&mut catalog, "P2", 4)?;
        sale.abandon(&mut catalog)?;

        assert_eq!(quantity(&catalog, "P1"), Some(10));
        assert_eq!(quantity(&catalog, "P2"), Some(4));

        Ok(())
    }

    #[test]
    fn commit_persists_ledger_and_catalog() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, mut ledger) = stores(&dir, 10)?;
        let mut sale = PendingSale::new("S1");

        sale.add_line(&mut catalog, "P1", 3)?;

        assert_eq!(ledger.commit(sale, &catalog)?, 1);
        assert_eq!(
            fs::read_to_string(ledger.path())?,
            "Sale ID,Product ID,Product Name,Quantity Sold,Total Price\nS1,P1,Widget,3,29.97\n"
        );

        let (on_disk, _report) = Catalog::open(catalog.path())?;
        assert_eq!(quantity(&on_disk, "P1"), Some(7));

        Ok(())
    }

    #[test]
    fn process_sale_records_lines_and_reports_rejections() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, mut ledger) = stores(&dir, 10)?;

        let (outcome, output) = run_sale(
            &mut ledger,
            &mut catalog,
            "S1\nP9\nP1\nmany\nP2\n5\nP1\n3\nP2\n4\nDONE\n",
        )?;

        assert_eq!(outcome, SaleOutcome::Recorded(2));
        assert!(output.contains("Invalid Product ID!"));
        assert!(output.contains("Invalid quantity! Please enter a valid number."));
        assert!(output.contains("Insufficient stock!"));
        assert!(output.contains("Enter quantity for Widget: "));
        assert!(output.ends_with("Sale recorded successfully!\n"));

        let lines: Vec<&SaleLine> = ledger.iter().collect();

        assert_eq!(
            lines,
            [
                &SaleLine::new("S1", "P1", "Widget", 3, "29.97".parse()?),
                &SaleLine::new("S1", "P2", "Gadget", 4, "10.00".parse()?),
            ]
        );
        assert_eq!(quantity(&catalog, "P1"), Some(7));
        assert_eq!(quantity(&catalog, "P2"), Some(0));

        Ok(())
    }

    #[test]
    fn process_sale_with_insufficient_stock_records_nothing_for_that_item() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, mut ledger) = stores(&dir, 2)?;

        let (outcome, output) = run_sale(&mut ledger, &mut catalog, "S1\nP1\n5\ndone\n")?;

        assert_eq!(outcome, SaleOutcome::Recorded(0));
        assert!(output.contains("Insufficient stock!"));
        assert!(ledger.is_empty());
        assert_eq!(quantity(&catalog, "P1"), Some(2));

        Ok(())
    }

    #[test]
    fn process_sale_abandons_when_input_ends() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, mut ledger) = stores(&dir, 10)?;

        let (outcome, _output) = run_sale(&mut ledger, &mut catalog, "S1\nP1\n3\nP2\n")?;

        assert_eq!(outcome, SaleOutcome::Abandoned);
        assert!(ledger.is_empty());
        assert_eq!(quantity(&catalog, "P1"), Some(10));
        assert_eq!(fs::read_to_string(ledger.path())?, "");

        Ok(())
    }

    #[test]
    fn sale_ids_may_repeat_across_sales() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, mut ledger) = stores(&dir, 10)?;

        run_sale(&mut ledger, &mut catalog, "S1\nP1\n1\ndone\n")?;
        run_sale(&mut ledger, &mut catalog, "S1\nP1\n2\ndone\n")?;

        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|line| line.sale_id == "S1"));
        assert_eq!(quantity(&catalog, "P1"), Some(7));

        Ok(())
    }

    #[test]
    fn recorded_lines_keep_their_snapshot() -> TestResult {
        let dir = tempdir()?;
        let (mut catalog, mut ledger) = stores(&dir, 10)?;

        run_sale(&mut ledger, &mut catalog, "S1\nP1\n3\ndone\n")?;
        catalog.update_product("P1", "Widget Pro", "50".parse()?)?;

        let (reopened, _report) = Ledger::open(ledger.path())?;

        for ledger in [&ledger, &reopened] {
            let line = ledger.iter().next();

            assert_eq!(line.map(|l| l.product_name.as_str()), Some("Widget"));
            assert_eq!(line.map(|l| l.total_price.to_string()), Some("29.97".to_string()));
        }

        Ok(())
    }

    #[test]
    fn open_parses_rows_and_skips_malformed_ones() -> TestResult {
        let dir = tempdir()?;
        let path = dir.path().join("sales.csv");

        fs::write(
            &path,
            "Sale ID,Product ID,Product Name,Quantity Sold,Total Price\nS1,P1,Widget,3,29.97\nS2,P1,Widget\n",
        )?;

        let (ledger, report) = Ledger::open(&path)?;

        assert_eq!(ledger.len(), 1);
        assert_eq!(report.skipped, 1);

        Ok(())
    }

    #[test]
    fn open_fails_on_unparsable_total() -> TestResult {
        let dir = tempdir()?;
        let path = dir.path().join("sales.csv");

        fs::write(
            &path,
            "Sale ID,Product ID,Product Name,Quantity Sold,Total Price\nS1,P1,Widget,3,free\n",
        )?;

        assert!(matches!(
            Ledger::open(&path),
            Err(StorageError::UnparsableValue {
                column: "Total Price",
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn write_to_reports_empty_ledger() -> TestResult {
        let dir = tempdir()?;
        let (ledger, _report) = Ledger::open(dir.path().join("sales.csv"))?;
        let mut out = Vec::new();

        ledger.write_to(&mut out)?;

        assert_eq!(String::from_utf8(out)?, "No sales recorded yet!\n");

        Ok(())
    }
}
