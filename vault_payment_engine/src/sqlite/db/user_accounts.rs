use chrono::Utc;
use sqlx::SqliteConnection;
use vault_common::Credits;

use crate::{
    db_types::{PaymentRecord, UserAccount},
    traits::AccountApiError,
};

pub async fn account_by_id(account_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, AccountApiError> {
    let account = sqlx::query_as(r#"SELECT * FROM user_accounts WHERE id = $1"#)
        .bind(account_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

pub async fn account_by_customer_id(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, AccountApiError> {
    let account = sqlx::query_as(r#"SELECT * FROM user_accounts WHERE customer_id = $1"#)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

pub async fn account_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, AccountApiError> {
    let account = sqlx::query_as(r#"SELECT * FROM user_accounts WHERE email = $1"#)
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

/// Creates the account for `customer_id` if it does not exist, returning its internal id. A
/// fresh email on an existing account is adopted; an absent one never clobbers a stored one.
pub async fn upsert_account(
    customer_id: &str,
    email: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<i64, AccountApiError> {
    let now = Utc::now();
    let id = sqlx::query_scalar(
        r#"
            INSERT INTO user_accounts (customer_id, email, created_at, updated_at) VALUES ($1, $2, $3, $3)
            ON CONFLICT (customer_id) DO UPDATE
            SET email = COALESCE(excluded.email, user_accounts.email), updated_at = $3
            RETURNING id;
        "#,
    )
    .bind(customer_id)
    .bind(email)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Adds `amount` to both the balance and the lifetime invested total in one statement, so the
/// two columns can never drift apart. Must be called inside the same transaction that flips the
/// payment row to `Credited`.
pub async fn adjust_balance(
    account_id: i64,
    amount: Credits,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, AccountApiError> {
    let account = sqlx::query_as(
        r#"
            UPDATE user_accounts
            SET balance = balance + $1, total_invested = total_invested + $1, updated_at = $2
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(account_id)
    .fetch_optional(conn)
    .await?
    .ok_or(AccountApiError::AccountNotFound(account_id))?;
    Ok(account)
}

pub async fn payments_for_account(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentRecord>, AccountApiError> {
    let payments = sqlx::query_as(r#"SELECT * FROM payments WHERE account_id = $1 ORDER BY created_at DESC, id DESC"#)
        .bind(account_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}
