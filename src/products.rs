//! Products

use slotmap::new_key_type;

use crate::prices::Price;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product ID, unique within a catalog
    pub id: String,

    /// Product name
    pub name: String,

    /// Unit price
    pub price: Price,

    /// Units on hand
    pub quantity: u32,
}

impl Product {
    /// Creates a new product.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price, quantity: u32) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Whether `quantity` units can be sold from current stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.quantity >= quantity
    }
}
