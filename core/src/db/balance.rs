use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait,
};
use serde::Serialize;

use super::values;
use crate::error::{EngineError, Result};
use crate::model::account;

/// No withdrawal may leave an account below this balance.
pub const MIN_BALANCE: Decimal = dec!(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BalanceAction {
    CheckBalance,
    Deposit(Decimal),
    Withdraw(Decimal),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceResult {
    pub account_id: String,
    pub action: BalanceAction,
    pub balance: Decimal,
    /// Stored text; rows written by import or the record mutator may carry a
    /// bare date here.
    pub last_updated: Option<String>,
}

async fn fetch_balance<C>(
    db: &C,
    account_id: &str,
) -> Result<Option<(Decimal, Option<String>)>, DbErr>
where
    C: ConnectionTrait,
{
    account::Entity::find()
        .select_only()
        .column(account::Column::AccountBalance)
        .column(account::Column::LastUpdated)
        .filter(account::Column::CustomerId.eq(account_id))
        .into_tuple()
        .one(db)
        .await
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::Validation(format!(
            "amount must not be negative, got {}",
            amount
        )));
    }
    Ok(())
}

/// Runs one balance action against `accounts`.
///
/// Deposits and withdrawals are single conditional updates evaluated by the
/// store, so the floor check and the write cannot be split by a concurrent
/// writer. A rejected withdrawal writes nothing.
pub async fn apply_action(
    db: &DatabaseConnection,
    account_id: &str,
    action: BalanceAction,
) -> Result<BalanceResult> {
    let account_id = account_id.trim();
    if account_id.is_empty() {
        return Err(EngineError::Validation(
            "account id must not be empty".to_owned(),
        ));
    }
    let not_found = || EngineError::AccountNotFound(account_id.to_owned());

    let (balance, last_updated) = match action {
        BalanceAction::CheckBalance => {
            fetch_balance(db, account_id).await?.ok_or_else(not_found)?
        }
        BalanceAction::Deposit(amount) => {
            check_amount(amount)?;
            let txn = db.begin().await?;
            let res = account::Entity::update_many()
                .col_expr(
                    account::Column::AccountBalance,
                    Expr::col(account::Column::AccountBalance).add(amount),
                )
                .col_expr(account::Column::LastUpdated, Expr::value(values::now()))
                .filter(account::Column::CustomerId.eq(account_id))
                .exec(&txn)
                .await?;
            if res.rows_affected == 0 {
                return Err(not_found());
            }
            let current = fetch_balance(&txn, account_id).await?.ok_or_else(not_found)?;
            txn.commit().await?;
            log::info!("deposited {} to {}", amount, account_id);
            current
        }
        BalanceAction::Withdraw(amount) => {
            check_amount(amount)?;
            let txn = db.begin().await?;
            let res = account::Entity::update_many()
                .col_expr(
                    account::Column::AccountBalance,
                    Expr::col(account::Column::AccountBalance).sub(amount),
                )
                .col_expr(account::Column::LastUpdated, Expr::value(values::now()))
                .filter(account::Column::CustomerId.eq(account_id))
                .filter(
                    Expr::expr(Expr::col(account::Column::AccountBalance).sub(amount))
                        .gte(MIN_BALANCE),
                )
                .exec(&txn)
                .await?;
            if res.rows_affected == 0 {
                let (balance, _) = fetch_balance(&txn, account_id)
                    .await?
                    .ok_or_else(not_found)?;
                log::warn!(
                    "withdrawal of {} from {} denied, balance {}",
                    amount,
                    account_id,
                    balance
                );
                return Err(EngineError::InsufficientFunds {
                    account_id: account_id.to_owned(),
                    balance,
                    requested: amount,
                });
            }
            let current = fetch_balance(&txn, account_id).await?.ok_or_else(not_found)?;
            txn.commit().await?;
            log::info!("withdrew {} from {}", amount, account_id);
            current
        }
    };

    Ok(BalanceResult {
        account_id: account_id.to_owned(),
        action,
        balance,
        last_updated,
    })
}
