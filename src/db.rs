//! Database initialization for the application's SQLite store.

use rusqlite::Connection;

use crate::{product, sales_record, user};

/// An alias for the integer row IDs used by the database.
pub type DatabaseId = i64;

/// Create the tables for the domain models and enable foreign key
/// enforcement on `connection`.
///
/// Foreign keys must be enabled per connection so that deleting a product
/// nulls out the references on its sales records instead of leaving them
/// dangling.
///
/// # Errors
/// Returns an error if any of the SQL queries failed.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    product::create_product_table(connection)?;
    sales_record::create_sales_record_table(connection)?;
    user::create_user_table(connection)?;

    Ok(())
}
