//! Active polling against Moneta's status API.
//!
//! Moneta's webhooks routinely go missing, so the platform asks us to poll when a user reports
//! that they have paid. The poll result is fed through the *same* normalizer and the same
//! reconciliation entry point as a webhook would be. There is deliberately no separate crediting
//! code path here; two paths would be two chances to double-credit.

use log::*;
use moneta_tools::{MonetaApi, MonetaApiError};
use vault_payment_engine::{
    db_types::{PaymentSource, Provider},
    providers::normalize,
    traits::LedgerDatabase,
    ReconciliationApi,
    ReconciliationResult,
};

use crate::errors::ServerError;

/// Polls Moneta once for `order_id` and reconciles whatever it reports.
///
/// "Moneta does not know the order yet" and "Moneta is down or slow" both come back as
/// [`ReconciliationResult::Pending`]; the caller retries later. Neither outcome may ever be
/// treated as a settled payment.
pub async fn poll_once<B: LedgerDatabase>(
    order_id: &str,
    customer_id: &str,
    moneta: &MonetaApi,
    api: &ReconciliationApi<B>,
) -> Result<ReconciliationResult, ServerError> {
    let payment = match moneta.get_payment(order_id).await {
        Ok(Some(payment)) => payment,
        Ok(None) => {
            debug!("📡️ Moneta has no record of order {order_id} yet. Reporting pending.");
            return Ok(ReconciliationResult::Pending);
        },
        Err(MonetaApiError::Unavailable(e)) => {
            warn!("📡️ Moneta is unavailable while polling order {order_id}. {e}. Reporting pending.");
            return Ok(ReconciliationResult::Pending);
        },
        Err(e) => {
            error!("📡️ Unexpected error polling Moneta for order {order_id}. {e}");
            return Err(ServerError::BackendError(e.to_string()));
        },
    };
    let raw = serde_json::to_value(&payment).map_err(|e| ServerError::BackendError(e.to_string()))?;
    let mut event = normalize(Provider::Moneta, &raw).map_err(|e| {
        error!("📡️ Moneta returned a payment for order {order_id} that could not be normalized. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    // The poll request names the user; use it when the provider payload does not.
    if event.customer_id.is_none() {
        event.customer_id = Some(customer_id.to_string());
    }
    let result = api.reconcile(event, PaymentSource::Poll).await?;
    debug!("📡️ Poll for order {order_id} reconciled as {result:?}");
    Ok(result)
}
