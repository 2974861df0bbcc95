use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use vault_common::Credits;

use crate::{
    db_types::{NewPaymentRecord, PaymentId, PaymentRecord, PaymentStatusType},
    traits::PaymentGatewayError,
};

/// Inserts the payment row if (and only if) the payment id has never been seen. Returns the new
/// row, or `None` if a row already existed. The unique index on `payment_id` is the concurrency
/// gate here; we never check-then-insert.
pub async fn insert_if_absent(
    record: &NewPaymentRecord,
    status: PaymentStatusType,
    processed_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
    let row = sqlx::query_as(
        r#"
            INSERT INTO payments
                (payment_id, account_id, amount, requested_amount, currency, status, source, provider, raw_payload,
                 note, created_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (payment_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(&record.payment_id)
    .bind(record.account_id)
    .bind(record.amount)
    .bind(record.requested_amount)
    .bind(record.currency.as_deref())
    .bind(status)
    .bind(record.source)
    .bind(record.provider)
    .bind(record.raw_payload.as_str())
    .bind(record.note.as_deref())
    .bind(Utc::now())
    .bind(processed_at)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn fetch_by_payment_id(
    id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
    let payment =
        sqlx::query_as(r#"SELECT * FROM payments WHERE payment_id = $1"#).bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Flips a creditable row to `Credited`, stamping the account, amount and settlement time.
/// Returns `None` when no row was in a creditable state, which the caller must disambiguate by
/// inspecting what exists. Rows already `Credited` are never touched again.
pub async fn mark_credited(
    id: &PaymentId,
    account_id: i64,
    amount: Credits,
    note: Option<&str>,
    override_expired: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
    let gate = if override_expired {
        "('Pending', 'PendingVerification', 'Expired')"
    } else {
        "('Pending', 'PendingVerification')"
    };
    let query = format!(
        r#"
            UPDATE payments
            SET status = 'Credited', account_id = $2, amount = $3, note = COALESCE($4, note), processed_at = $5
            WHERE payment_id = $1 AND status IN {gate}
            RETURNING *;
        "#
    );
    let row = sqlx::query_as(&query)
        .bind(id)
        .bind(account_id)
        .bind(amount)
        .bind(note)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Parks a `Pending` row for operator follow-up.
pub async fn mark_for_review(
    id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
    let row = sqlx::query_as(
        r#"
            UPDATE payments SET status = 'PendingVerification'
            WHERE payment_id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Flips a non-terminal row to `Rejected`, recording the reason in the note column.
pub async fn mark_rejected(
    id: &PaymentId,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
    let row = sqlx::query_as(
        r#"
            UPDATE payments SET status = 'Rejected', note = $2, processed_at = $3
            WHERE payment_id = $1 AND status IN ('Pending', 'PendingVerification')
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Expires every non-terminal row that was first seen before `cutoff`, returning the rows that
/// were flipped.
pub async fn expire_older_than(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentRecord>, PaymentGatewayError> {
    let rows = sqlx::query_as(
        r#"
            UPDATE payments SET status = 'Expired', processed_at = $2
            WHERE status IN ('Pending', 'PendingVerification') AND created_at < $1
            RETURNING *;
        "#,
    )
    .bind(cutoff)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
