//! The product catalog: model, table and point lookups.
//!
//! Products are read-mostly. Sales records copy a product's attributes
//! into a snapshot at creation time, so later edits or deletions of the
//! product never rewrite history.

use std::str::FromStr;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, db::DatabaseId};

/// An item that can be sold, identified publicly by its UUID.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// The product's ID in the application database.
    pub id: DatabaseId,
    /// The public identifier of the product.
    pub uuid: Uuid,
    /// The display name of the product.
    pub name: String,
    /// A free-text category label. May be empty.
    pub category: String,
    /// The unit price. Never negative.
    pub price: Decimal,
}

/// The data needed to create a new [Product].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    /// The display name of the product.
    pub name: String,
    /// A free-text category label. May be empty.
    pub category: String,
    /// The unit price. Must not be negative.
    pub price: Decimal,
}

pub(crate) fn create_product_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS product (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            price TEXT NOT NULL
        )",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_product_category ON product(category)",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_product(row: &Row, offset: usize) -> Result<Product, rusqlite::Error> {
    let price_text: String = row.get(offset + 4)?;
    let price = parse_stored_decimal(&price_text, row, offset + 4)?;

    Ok(Product {
        id: row.get(offset)?,
        uuid: parse_stored_uuid(row, offset + 1)?,
        name: row.get(offset + 2)?,
        category: row.get(offset + 3)?,
        price,
    })
}

pub(crate) fn parse_stored_decimal(
    text: &str,
    row: &Row,
    index: usize,
) -> Result<Decimal, rusqlite::Error> {
    Decimal::from_str(text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            row.get_ref(index)
                .map(|value| value.data_type())
                .unwrap_or(rusqlite::types::Type::Text),
            Box::new(error),
        )
    })
}

pub(crate) fn parse_stored_uuid(row: &Row, index: usize) -> Result<Uuid, rusqlite::Error> {
    let text: String = row.get(index)?;

    Uuid::parse_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

/// Create a new product.
///
/// # Errors
/// Returns [Error::NegativeAmount] if the price is negative, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn create_product(new_product: NewProduct, connection: &Connection) -> Result<Product, Error> {
    if new_product.price.is_sign_negative() {
        return Err(Error::NegativeAmount(new_product.price.to_string()));
    }

    let uuid = Uuid::new_v4();

    connection.execute(
        "INSERT INTO product (uuid, name, category, price) VALUES (?1, ?2, ?3, ?4)",
        (
            uuid.to_string(),
            &new_product.name,
            &new_product.category,
            new_product.price.to_string(),
        ),
    )?;

    Ok(Product {
        id: connection.last_insert_rowid(),
        uuid,
        name: new_product.name,
        category: new_product.category,
        price: new_product.price,
    })
}

/// Retrieve a product by its public identifier.
///
/// # Errors
/// Returns [Error::NotFound] if `uuid` does not refer to a product, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_product_by_uuid(uuid: &Uuid, connection: &Connection) -> Result<Product, Error> {
    let product = connection
        .prepare("SELECT id, uuid, name, category, price FROM product WHERE uuid = ?1")?
        .query_row((uuid.to_string(),), |row| map_row_to_product(row, 0))?;

    Ok(product)
}

/// Retrieve a product by its database ID.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a product, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_product(id: DatabaseId, connection: &Connection) -> Result<Product, Error> {
    let product = connection
        .prepare("SELECT id, uuid, name, category, price FROM product WHERE id = ?1")?
        .query_row((id,), |row| map_row_to_product(row, 0))?;

    Ok(product)
}

/// Delete a product.
///
/// Sales records referencing the product keep their snapshot; the foreign
/// key becomes NULL.
///
/// # Errors
/// Returns [Error::NotFound] if `uuid` does not refer to a product, or
/// [Error::SqlError] if there is some other SQL error.
pub fn delete_product(uuid: &Uuid, connection: &Connection) -> Result<(), Error> {
    let rows_deleted =
        connection.execute("DELETE FROM product WHERE uuid = ?1", (uuid.to_string(),))?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
