use chrono::Duration;
use log::*;
use tokio::task::JoinHandle;
use vault_payment_engine::{db_types::PaymentRecord, ReconciliationApi, SqliteDatabase};

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, payments that have sat in `Pending`/`PendingVerification` longer than `window`
/// are flipped to `Expired`, bounding how long ambiguous money stays unresolved. An expired
/// payment can only be credited through an operator override afterwards.
pub fn start_expiry_worker(db: SqliteDatabase, window: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = ReconciliationApi::new(db);
        info!("🕰️ Payment expiry worker started (window: {}h)", window.num_hours());
        loop {
            timer.tick().await;
            trace!("🕰️ Running payment expiry job");
            match api.expire_old_payments(window).await {
                Ok(expired) if expired.is_empty() => {},
                Ok(expired) => {
                    info!("🕰️ {} payments expired: {}", expired.len(), payment_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running payment expiry job: {e}");
                },
            }
        }
    })
}

fn payment_list(payments: &[PaymentRecord]) -> String {
    payments
        .iter()
        .map(|p| format!("[{}] payment_id: {} source: {}", p.id, p.payment_id, p.source))
        .collect::<Vec<String>>()
        .join(", ")
}
