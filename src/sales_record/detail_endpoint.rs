//! The single sales record endpoint.

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{AppState, Error};

use super::{query::get_sales_record_by_uuid, view::SalesRecordResponse};

/// Handler for fetching a single sales record by its UUID.
///
/// Responses are not cached: point lookups are cheap and the listing
/// namespaces carry all the invalidation complexity.
///
/// # Errors
/// Returns [Error::NotFound] if `record_id` is not the UUID of a record.
pub async fn get_sales_record_endpoint(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<Json<SalesRecordResponse>, Error> {
    let uuid = Uuid::parse_str(&record_id).map_err(|_| Error::NotFound)?;

    let record = {
        let connection = state.db_connection.lock().unwrap();
        get_sales_record_by_uuid(&uuid, &connection)?
    };

    Ok(Json(SalesRecordResponse::from(&record)))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::{
        endpoints,
        test_utils::{seed_product, seed_sale, test_api, test_state},
    };

    fn detail_path(record_id: &str) -> String {
        endpoints::SALES_DATA_DETAIL.replace("{record_id}", record_id)
    }

    #[tokio::test]
    async fn fetches_a_record_by_uuid() {
        let state = test_state();
        let product = seed_product(&state, "Test Product", "Test Category", "100.00");
        let record = seed_sale(
            &state,
            Some(product.id),
            5,
            "500.00",
            datetime!(2024 - 09 - 01 00:00:00 UTC),
        );
        let (server, token) = test_api(&state);

        let response = server
            .get(&detail_path(&record.uuid.to_string()))
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["id"], record.uuid.to_string());
        assert_eq!(body["product"]["name"], "Test Product");
        assert_eq!(body["total_sales_amount"], "500.00");
    }

    #[tokio::test]
    async fn unknown_uuid_is_not_found() {
        let state = test_state();
        let (server, token) = test_api(&state);

        let response = server
            .get(&detail_path(&Uuid::new_v4().to_string()))
            .authorization_bearer(token)
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn malformed_uuid_is_not_found() {
        let state = test_state();
        let (server, token) = test_api(&state);

        let response = server
            .get(&detail_path("not-a-uuid"))
            .authorization_bearer(token)
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn detail_requires_authentication() {
        let state = test_state();
        let (server, _token) = test_api(&state);

        let response = server.get(&detail_path(&Uuid::new_v4().to_string())).await;

        response.assert_status_forbidden();
    }
}
