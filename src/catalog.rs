//! Catalog
//!
//! The catalog owns every known product and mirrors them to a tabular file. Products are
//! kept in a [`SlotMap`] so iteration follows insertion order, with a string index for
//! lookups by product ID.

use std::{
    io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use serde::Serialize;
use slotmap::SlotMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    prices::Price,
    products::{Product, ProductKey},
    render,
    storage::{self, LoadReport, StorageError},
};

/// Header row of the catalog file.
pub const CATALOG_HEADER: [&str; 4] = ["Product ID", "Name", "Price", "Quantity"];

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A product with this ID already exists.
    #[error("Product ID already exists!")]
    DuplicateKey(String),

    /// No product has this ID.
    #[error("product {0:?} not found")]
    UnknownProduct(String),

    /// A quantity adjustment would leave stock outside the representable range.
    #[error("adjusting quantity of {id:?} ({quantity}) by {delta} is out of range")]
    QuantityOutOfRange {
        /// Product ID
        id: String,
        /// Quantity before the adjustment
        quantity: u32,
        /// Requested adjustment
        delta: i64,
    },

    /// The catalog file could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct CatalogRow<'a> {
    id: &'a str,
    name: &'a str,
    price: Price,
    quantity: u32,
}

impl<'a> From<&'a Product> for CatalogRow<'a> {
    fn from(product: &'a Product) -> Self {
        CatalogRow {
            id: &product.id,
            name: &product.name,
            price: product.price,
            quantity: product.quantity,
        }
    }
}

/// File-backed product catalog.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    products: SlotMap<ProductKey, Product>,
    keys: FxHashMap<String, ProductKey>,
}

impl Catalog {
    /// Opens the catalog stored at `path`, creating an empty file if it does not exist.
    ///
    /// A later row with an ID seen earlier in the file replaces the earlier values.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file cannot be read or holds an unparsable price
    /// or quantity.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, LoadReport), StorageError> {
        let path = path.into();
        let rows = storage::read_rows(&path, CATALOG_HEADER.len())?;

        let mut catalog = Catalog {
            path,
            products: SlotMap::with_key(),
            keys: FxHashMap::default(),
        };

        for record in &rows.records {
            let product = Product::new(
                storage::text(record, 0),
                storage::text(record, 1),
                storage::parse(&catalog.path, record, 2, "Price")?,
                storage::parse(&catalog.path, record, 3, "Quantity")?,
            );

            catalog.insert(product);
        }

        let report = LoadReport {
            loaded: catalog.len(),
            ..rows.report
        };

        debug!(path = %catalog.path.display(), ?report, "opened catalog");

        Ok((catalog, report))
    }

    fn insert(&mut self, product: Product) -> ProductKey {
        if let Some(&key) = self.keys.get(&product.id) {
            if let Some(existing) = self.products.get_mut(key) {
                *existing = product;

                return key;
            }
        }

        let id = product.id.clone();
        let key = self.products.insert(product);

        self.keys.insert(id, key);

        key
    }

    /// Adds a new product and persists the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateKey`] without changing anything if the ID is
    /// already present, or a storage error if the catalog cannot be written. The product
    /// is not kept when the write fails.
    pub fn add_product(&mut self, product: Product) -> Result<ProductKey, CatalogError> {
        if self.keys.contains_key(&product.id) {
            return Err(CatalogError::DuplicateKey(product.id));
        }

        let id = product.id.clone();
        let key = self.insert(product);

        if let Err(error) = self.persist() {
            self.products.remove(key);
            self.keys.remove(&id);

            return Err(error.into());
        }

        info!(product = %id, "added product");

        Ok(key)
    }

    /// Replaces the name and price of an existing product and persists the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownProduct`] if no product has this ID, or a storage
    /// error if the catalog cannot be written.
    pub fn update_product(
        &mut self,
        id: &str,
        name: impl Into<String>,
        price: Price,
    ) -> Result<(), CatalogError> {
        let product = self
            .key(id)
            .and_then(|key| self.products.get_mut(key))
            .ok_or_else(|| CatalogError::UnknownProduct(id.to_string()))?;

        product.name = name.into();
        product.price = price;

        self.persist()?;

        Ok(())
    }

    /// Looks up a product by ID.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.key(id).and_then(|key| self.products.get(key))
    }

    /// Key of the product with this ID.
    pub fn key(&self, id: &str) -> Option<ProductKey> {
        self.keys.get(id).copied()
    }

    /// Looks up a product by key.
    pub fn product(&self, key: ProductKey) -> Option<&Product> {
        self.products.get(key)
    }

    /// Applies `delta` to a product's quantity and returns the new quantity.
    ///
    /// Callers check stock before selling; this only guards the integer range. The change
    /// is not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::QuantityOutOfRange`] if the result would be negative or
    /// overflow, leaving the quantity unchanged.
    pub fn adjust_quantity(&mut self, key: ProductKey, delta: i64) -> Result<u32, CatalogError> {
        let product = self
            .products
            .get_mut(key)
            .ok_or_else(|| CatalogError::UnknownProduct(format!("{key:?}")))?;

        let adjusted = i64::from(product.quantity)
            .checked_add(delta)
            .and_then(|quantity| u32::try_from(quantity).ok())
            .ok_or_else(|| CatalogError::QuantityOutOfRange {
                id: product.id.clone(),
                quantity: product.quantity,
                delta,
            })?;

        product.quantity = adjusted;

        Ok(adjusted)
    }

    /// Rewrites the catalog file from memory.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file cannot be written.
    pub fn persist(&self) -> Result<(), StorageError> {
        storage::write_rows(
            &self.path,
            &CATALOG_HEADER,
            self.products.values().map(CatalogRow::from),
        )
    }

    /// Iterate over the products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the catalog as a table, or a notice when it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        if self.is_empty() {
            return writeln!(out, "Inventory is empty!");
        }

        let table = render::grid(
            CATALOG_HEADER,
            self.iter().map(|product| {
                [
                    product.id.clone(),
                    product.name.clone(),
                    product.price.to_string(),
                    product.quantity.to_string(),
                ]
            }),
            2..4,
        );

        writeln!(out, "{table}")
    }
}
