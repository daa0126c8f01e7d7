//! Response shapes for the sales data endpoints.

use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{aggregation::AggregationGroup, product::Product};

use super::models::SalesRecord;

/// The product details embedded in a sales record response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    /// The public identifier of the product.
    pub id: Uuid,
    /// The display name of the product.
    pub name: String,
    /// The product's category label.
    pub category: String,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.uuid,
            name: product.name.clone(),
            category: product.category.clone(),
        }
    }
}

/// One sales record as rendered by the list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecordResponse {
    /// The public identifier of the record.
    pub id: Uuid,
    /// The product details, or null if the product has been deleted.
    pub product: Option<ProductResponse>,
    /// How many units were sold.
    pub quantity_sold: i64,
    /// The total amount of the sale, with two decimal places.
    pub total_sales_amount: String,
    /// When the sale happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date_of_sale: OffsetDateTime,
}

impl From<&SalesRecord> for SalesRecordResponse {
    fn from(record: &SalesRecord) -> Self {
        Self {
            id: record.uuid,
            product: record.product.as_ref().map(ProductResponse::from),
            quantity_sold: record.quantity_sold,
            total_sales_amount: format_amount(record.total_sales_amount),
            date_of_sale: record.date_of_sale,
        }
    }
}

/// One aggregation group as rendered by the aggregate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationGroupResponse {
    /// The grouping value: `YYYY-MM` for months, the category label (or
    /// "Unknown") for categories.
    pub group: String,
    /// The total sales amount, with two decimal places.
    pub total_sales: String,
    /// The average unit price, with two decimal places.
    pub average_price: String,
}

impl From<&AggregationGroup> for AggregationGroupResponse {
    fn from(group: &AggregationGroup) -> Self {
        Self {
            group: group.group.label(),
            total_sales: format_amount(group.total_sales),
            average_price: format_amount(group.average_price),
        }
    }
}

/// Render a monetary amount with exactly two decimal places, rounding
/// half-to-even like the decimal arithmetic the amounts come from.
pub(crate) fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);

    amount.to_string()
}

/// Wrap an already serialized JSON payload in a response.
///
/// Cached payloads are stored serialized, so both the hit and miss paths
/// return them without another serialization pass.
pub(crate) fn json_payload_response(payload: String) -> Response {
    ([(CONTENT_TYPE, "application/json")], payload).into_response()
}
