//! The core data model for sales records.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use uuid::Uuid;

use crate::{
    db::DatabaseId,
    product::{Product, map_row_to_product, parse_stored_decimal, parse_stored_uuid},
};

/// A point-in-time copy of a product's attributes, embedded in a sales
/// record when it is created.
///
/// The snapshot is never recomputed after the owning record is created,
/// even if the source product later changes or is deleted: historical
/// sales reporting must reflect the product as it was at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// The product name at sale time.
    pub name: String,
    /// The product category at sale time.
    #[serde(default)]
    pub category: String,
    /// The unit price at sale time, as its decimal string rendering.
    pub price: String,
}

impl ProductSnapshot {
    /// Capture a snapshot of `product` as it is now.
    pub fn capture(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
        }
    }
}

/// One recorded sale event.
///
/// `product` is the live product row if it still exists; `snapshot` is the
/// product as it was when the sale was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// The record's ID in the application database.
    pub id: DatabaseId,
    /// The public identifier of the record.
    pub uuid: Uuid,
    /// The referenced product, absent if it has been deleted since.
    pub product: Option<Product>,
    /// The product attributes captured when the sale was recorded.
    pub snapshot: Option<ProductSnapshot>,
    /// How many units were sold. At least 1 for records created through
    /// the service functions.
    pub quantity_sold: i64,
    /// The total amount of the sale. Never negative.
    pub total_sales_amount: Decimal,
    /// When the sale happened, in UTC.
    pub date_of_sale: OffsetDateTime,
}

/// The data needed to create a new [SalesRecord].
#[derive(Debug, Clone, PartialEq)]
pub struct NewSalesRecord {
    /// The database ID of the product that was sold, if any.
    pub product_id: Option<DatabaseId>,
    /// How many units were sold. Must be at least 1.
    pub quantity_sold: i64,
    /// The total amount of the sale. Must not be negative.
    pub total_sales_amount: Decimal,
    /// When the sale happened, in UTC.
    pub date_of_sale: OffsetDateTime,
}

/// A correction to an existing [SalesRecord].
///
/// Only the quantity and amount can be corrected; the snapshot and sale
/// date are fixed at creation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesRecordCorrection {
    /// The corrected quantity, if it changed. Must be at least 1.
    pub quantity_sold: Option<i64>,
    /// The corrected amount, if it changed. Must not be negative.
    pub total_sales_amount: Option<Decimal>,
}

const DATE_OF_SALE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// Encode a sale timestamp for storage.
///
/// The encoding is UTC with fixed-width microsecond precision, so the
/// TEXT column orders and compares chronologically.
pub(crate) fn encode_date_of_sale(value: OffsetDateTime) -> String {
    let value = value.to_offset(UtcOffset::UTC);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
        value.year(),
        u8::from(value.month()),
        value.day(),
        value.hour(),
        value.minute(),
        value.second(),
        value.microsecond(),
    )
}

fn decode_date_of_sale(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let text: String = row.get(index)?;

    PrimitiveDateTime::parse(&text, DATE_OF_SALE_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })
}

pub(crate) fn create_sales_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sales_record (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            product_id INTEGER REFERENCES product(id) ON DELETE SET NULL,
            product_snapshot TEXT NOT NULL DEFAULT '{}',
            quantity_sold INTEGER NOT NULL DEFAULT 1,
            total_sales_amount TEXT NOT NULL DEFAULT '0',
            date_of_sale TEXT NOT NULL
        )",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_record_date ON sales_record(date_of_sale)",
        (),
    )?;

    Ok(())
}

/// The column list matching [map_row_to_sales_record], with the record
/// aliased as `s` and the LEFT JOINed product as `p`.
pub(crate) const SALES_RECORD_COLUMNS: &str = "s.uuid, s.quantity_sold, s.total_sales_amount, \
    s.date_of_sale, s.product_snapshot, s.id, \
    p.id, p.uuid, p.name, p.category, p.price";

pub(crate) fn map_row_to_sales_record(row: &Row) -> Result<SalesRecord, rusqlite::Error> {
    let amount_text: String = row.get(2)?;
    let snapshot_text: String = row.get(4)?;

    let product = match row.get::<usize, Option<DatabaseId>>(6)? {
        Some(_) => Some(map_row_to_product(row, 6)?),
        None => None,
    };

    // A snapshot of `{}` means the record was created without a product.
    let snapshot: Option<ProductSnapshot> = serde_json::from_str(&snapshot_text).ok();

    Ok(SalesRecord {
        id: row.get(5)?,
        uuid: parse_stored_uuid(row, 0)?,
        product,
        snapshot,
        quantity_sold: row.get(1)?,
        total_sales_amount: parse_stored_decimal(&amount_text, row, 2)?,
        date_of_sale: decode_date_of_sale(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::encode_date_of_sale;

    #[test]
    fn encoding_is_utc_with_fixed_width() {
        let got = encode_date_of_sale(datetime!(2024 - 09 - 01 00:00:00 +03:00));

        assert_eq!(got, "2024-08-31 21:00:00.000000");
    }

    #[test]
    fn encoding_orders_chronologically() {
        let earlier = encode_date_of_sale(datetime!(2024 - 09 - 01 23:59:59.999999 UTC));
        let later = encode_date_of_sale(datetime!(2024 - 09 - 02 00:00:00 UTC));

        assert!(earlier < later);
    }
}
