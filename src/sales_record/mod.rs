//! The sales ledger: models, queries, mutation services, and the read
//! endpoints serving it.

mod aggregate_endpoint;
mod core;
mod detail_endpoint;
mod list_endpoint;
pub(crate) mod models;
pub(crate) mod query;
mod view;

pub use aggregate_endpoint::get_sales_aggregate_endpoint;
pub use core::{create_sales_record, delete_sales_record, update_sales_record};
pub use detail_endpoint::get_sales_record_endpoint;
pub use list_endpoint::get_sales_records_endpoint;
pub use models::{NewSalesRecord, ProductSnapshot, SalesRecord, SalesRecordCorrection};
pub(crate) use models::create_sales_record_table;
pub use view::{AggregationGroupResponse, ProductResponse, SalesRecordResponse};
