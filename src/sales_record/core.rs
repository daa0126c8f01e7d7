//! Mutation services for the sales ledger.
//!
//! The HTTP surface of the service is read-only; sales records enter and
//! leave the ledger through these functions. Each one commits its change
//! and then synchronously evicts the response cache namespaces that
//! depend on sales record state, so that a read issued after the mutation
//! returns never sees stale cached data.

use rusqlite::Connection;
use uuid::Uuid;

use crate::{AppState, Error, invalidation::invalidate_sales_record_caches, product::get_product};

use super::{
    models::{NewSalesRecord, ProductSnapshot, SalesRecord, SalesRecordCorrection, encode_date_of_sale},
    query::get_sales_record_by_uuid,
};

/// Record a new sale.
///
/// If the sale references a product, the product's current name, category
/// and price are copied into the record's snapshot; the snapshot is never
/// updated afterwards.
///
/// # Errors
/// Returns [Error::InvalidQuantity] if the quantity is below 1,
/// [Error::NegativeAmount] if the amount is negative, [Error::NotFound] if
/// the referenced product does not exist, or [Error::SqlError] on other
/// SQL errors.
pub fn create_sales_record(
    state: &AppState,
    new_record: NewSalesRecord,
) -> Result<SalesRecord, Error> {
    validate_quantity(new_record.quantity_sold)?;
    validate_amount(&new_record.total_sales_amount)?;

    let record = {
        let connection = state.db_connection.lock().unwrap();
        insert_sales_record(new_record, &connection)?
    };

    invalidate_sales_record_caches(state.cache.as_ref());

    Ok(record)
}

/// Correct the quantity and/or amount of an existing sale.
///
/// The snapshot and sale date are fixed at creation and cannot be
/// corrected.
///
/// # Errors
/// Returns [Error::UpdateMissingSalesRecord] if `uuid` does not refer to a
/// record, [Error::InvalidQuantity]/[Error::NegativeAmount] if a corrected
/// value is out of range, or [Error::SqlError] on other SQL errors.
pub fn update_sales_record(
    state: &AppState,
    uuid: &Uuid,
    correction: SalesRecordCorrection,
) -> Result<SalesRecord, Error> {
    if let Some(quantity_sold) = correction.quantity_sold {
        validate_quantity(quantity_sold)?;
    }
    if let Some(total_sales_amount) = &correction.total_sales_amount {
        validate_amount(total_sales_amount)?;
    }

    let record = {
        let connection = state.db_connection.lock().unwrap();

        let rows_updated = connection.execute(
            "UPDATE sales_record SET \
             quantity_sold = COALESCE(?1, quantity_sold), \
             total_sales_amount = COALESCE(?2, total_sales_amount) \
             WHERE uuid = ?3",
            (
                correction.quantity_sold,
                correction
                    .total_sales_amount
                    .map(|amount| amount.to_string()),
                uuid.to_string(),
            ),
        )?;

        if rows_updated == 0 {
            return Err(Error::UpdateMissingSalesRecord);
        }

        get_sales_record_by_uuid(uuid, &connection)?
    };

    invalidate_sales_record_caches(state.cache.as_ref());

    Ok(record)
}

/// Remove a sale from the ledger.
///
/// # Errors
/// Returns [Error::DeleteMissingSalesRecord] if `uuid` does not refer to a
/// record, or [Error::SqlError] on other SQL errors.
pub fn delete_sales_record(state: &AppState, uuid: &Uuid) -> Result<(), Error> {
    {
        let connection = state.db_connection.lock().unwrap();

        let rows_deleted = connection.execute(
            "DELETE FROM sales_record WHERE uuid = ?1",
            (uuid.to_string(),),
        )?;

        if rows_deleted == 0 {
            return Err(Error::DeleteMissingSalesRecord);
        }
    }

    invalidate_sales_record_caches(state.cache.as_ref());

    Ok(())
}

fn validate_quantity(quantity_sold: i64) -> Result<(), Error> {
    if quantity_sold < 1 {
        return Err(Error::InvalidQuantity(quantity_sold));
    }

    Ok(())
}

fn validate_amount(amount: &rust_decimal::Decimal) -> Result<(), Error> {
    if amount.is_sign_negative() {
        return Err(Error::NegativeAmount(amount.to_string()));
    }

    Ok(())
}

fn insert_sales_record(
    new_record: NewSalesRecord,
    connection: &Connection,
) -> Result<SalesRecord, Error> {
    let product = match new_record.product_id {
        Some(product_id) => Some(get_product(product_id, connection)?),
        None => None,
    };
    let snapshot = product.as_ref().map(ProductSnapshot::capture);

    let snapshot_json = match &snapshot {
        Some(snapshot) => serde_json::to_string(snapshot)
            .map_err(|error| Error::JSONSerializationError(error.to_string()))?,
        None => "{}".to_owned(),
    };

    let uuid = Uuid::new_v4();

    connection.execute(
        "INSERT INTO sales_record \
         (uuid, product_id, product_snapshot, quantity_sold, total_sales_amount, date_of_sale) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            uuid.to_string(),
            new_record.product_id,
            snapshot_json,
            new_record.quantity_sold,
            new_record.total_sales_amount.to_string(),
            encode_date_of_sale(new_record.date_of_sale),
        ),
    )?;

    Ok(SalesRecord {
        id: connection.last_insert_rowid(),
        uuid,
        product,
        snapshot,
        quantity_sold: new_record.quantity_sold,
        total_sales_amount: new_record.total_sales_amount,
        date_of_sale: new_record.date_of_sale,
    })
}
