//! Bulk inventory import from CSV exports.
//!
//! Expected header: `title,location,price,quantity,vatTax,otherCost[,status]`.
//! Blank optional cells fall back to 0 or `"Available"`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::records::NewProduct;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read inventory export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid inventory CSV at row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("invalid inventory row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

#[derive(Debug, Default)]
pub struct InventoryImporter;

impl InventoryImporter {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<NewProduct>, ImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse every row, stopping at the first malformed one. Row numbers are
    /// 1-based and exclude the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<NewProduct>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut products = Vec::new();

        for (index, record) in csv_reader.deserialize::<InventoryRow>().enumerate() {
            let row = index + 1;
            let parsed = record.map_err(|source| ImportError::Csv { row, source })?;
            products.push(parsed.into_product(row)?);
        }

        Ok(products)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryRow {
    title: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    price: f64,
    quantity: i64,
    #[serde(default)]
    vat_tax: Option<f64>,
    #[serde(default)]
    other_cost: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

impl InventoryRow {
    fn into_product(self, row: usize) -> Result<NewProduct, ImportError> {
        let invalid = |reason: &str| ImportError::InvalidRow {
            row,
            reason: reason.to_string(),
        };
        if self.title.is_empty() {
            return Err(invalid("title is required"));
        }
        if self.quantity < 0 {
            return Err(invalid("quantity must not be negative"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(invalid("price must be a non-negative amount"));
        }

        Ok(NewProduct {
            title: self.title,
            description: None,
            location: self.location,
            price: self.price,
            quantity: self.quantity,
            status: self.status,
            vat_tax: self.vat_tax,
            other_cost: self.other_cost,
            images: Vec::new(),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
