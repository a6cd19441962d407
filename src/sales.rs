//! Sale lines

use serde::Serialize;

use crate::prices::Price;

/// One product sold within a sale.
///
/// The product name and total price are copied from the catalog when the line is
/// recorded, so later catalog changes do not alter historical lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLine {
    /// Operator supplied sale identifier, shared by every line of a sale
    pub sale_id: String,

    /// ID of the product sold
    pub product_id: String,

    /// Product name at the time of sale
    pub product_name: String,

    /// Units sold
    pub quantity_sold: u32,

    /// Unit price times units sold, at the time of sale
    pub total_price: Price,
}

impl SaleLine {
    /// Creates a new sale line.
    pub fn new(
        sale_id: impl Into<String>,
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity_sold: u32,
        total_price: Price,
    ) -> Self {
        SaleLine {
            sale_id: sale_id.into(),
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity_sold,
            total_price,
        }
    }
}
