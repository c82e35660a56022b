//! Order-management operations.
//!
//! Each operation maps an order with [`OrderLineMapper`], builds the matching payload
//! and sends it through a [`LedyerClient`] to the configured endpoint template.

use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    client::{HttpMethod, HttpTransport, LedyerClient},
    error::{LedyerError, Result},
    mapper::{MappedOrder, OrderLineMapper},
    order::OrderStore,
    settings::EndpointSettings,
};

/// Replaces lines and totals of an existing Ledyer order.
///
/// # Errors
///
/// Returns `LedyerError::DataError` for an invalid order id or order state, and any
/// client error from the request.
#[instrument(skip(client, mapper, endpoints, order))]
pub async fn edit_order<T, S>(
    client: &LedyerClient<T>,
    mapper: &OrderLineMapper,
    endpoints: &EndpointSettings,
    ledyer_order_id: &str,
    order: &mut S,
) -> Result<Value>
where
    T: HttpTransport,
    S: OrderStore + ?Sized,
{
    let endpoint = resolve(endpoints.edit_order(), ledyer_order_id)?;
    let payload = serde_json::to_value(mapper.map_order(order)?.into_edit_payload())?;

    let response = client.request(HttpMethod::Post, &endpoint, Some(&payload)).await?;
    info!(ledyer_order_id, "order lines updated");
    Ok(response)
}

/// Captures a Ledyer order for the mapped lines and amount.
///
/// # Errors
///
/// Returns `LedyerError::DataError` for an invalid order id or order state, and any
/// client error from the request.
#[instrument(skip(client, mapper, endpoints, order))]
pub async fn capture_order<T, S>(
    client: &LedyerClient<T>,
    mapper: &OrderLineMapper,
    endpoints: &EndpointSettings,
    ledyer_order_id: &str,
    order: &mut S,
) -> Result<Value>
where
    T: HttpTransport,
    S: OrderStore + ?Sized,
{
    let endpoint = resolve(endpoints.capture_order(), ledyer_order_id)?;
    let mapped: MappedOrder = mapper.map_order(order)?;
    let amount = mapped.totals.total_amount;
    let payload = serde_json::to_value(mapped.into_capture_payload())?;

    let response = client.request(HttpMethod::Post, &endpoint, Some(&payload)).await?;
    info!(ledyer_order_id, amount, "order captured");
    Ok(response)
}

/// Substitutes `{id}` in an endpoint template.
///
/// # Errors
///
/// Returns `LedyerError::DataError` if the id is empty or contains characters other
/// than ASCII letters, digits, `-` and `_`.
///
/// # Examples
///
/// ```
/// use ledyer_om::operations::resolve;
///
/// assert_eq!(resolve("/v1/orders/{id}/edit", "or_2Nq")?, "/v1/orders/or_2Nq/edit");
/// assert!(resolve("/v1/orders/{id}/edit", "../admin").is_err());
/// # Ok::<(), ledyer_om::LedyerError>(())
/// ```
pub fn resolve(template: &str, ledyer_order_id: &str) -> Result<String> {
    let valid = !ledyer_order_id.is_empty()
        && ledyer_order_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(LedyerError::DataError(format!("invalid Ledyer order id: {ledyer_order_id:?}")));
    }
    Ok(template.replace("{id}", ledyer_order_id))
}
