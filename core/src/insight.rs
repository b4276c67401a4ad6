use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;

use crate::db::ResultSet;
use crate::error::{EngineError, Result};

/// A fixed, parameterless, read-only question over the store.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Insight {
    pub id: u32,
    pub question: &'static str,
    pub sql: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Clone, Debug, Serialize)]
pub struct InsightResult {
    pub insight: Insight,
    pub rows: ResultSet,
}

const CATALOG: &[Insight] = &[
    Insight {
        id: 1,
        question: "How many customers exist per city, and what is their average account balance?",
        sql: r#"SELECT c.city, COUNT(*) AS total_customers, AVG(a.account_balance) AS average_balance
FROM customers c
JOIN accounts a ON c.customer_id = a.customer_id
GROUP BY c.city"#,
        columns: &["city", "total_customers", "average_balance"],
    },
    Insight {
        id: 2,
        question: "Which account type (Savings, Current, Loan) holds the highest total balance?",
        sql: r#"SELECT account_type, SUM(balance) AS total_balance
FROM (
    SELECT 'Savings/Current' AS account_type, account_balance AS balance
    FROM accounts
    WHERE account_type IN ('Savings', 'Current')
    UNION ALL
    SELECT 'Loan' AS account_type, loan_amount AS balance
    FROM loans
)
GROUP BY account_type
ORDER BY total_balance DESC
LIMIT 1"#,
        columns: &["account_type", "total_balance"],
    },
    Insight {
        id: 3,
        question: "Who are the top 10 customers by total account balance across all account types?",
        sql: r#"SELECT c.customer_id, c.name, SUM(a.account_balance) AS total_balance
FROM customers c
JOIN accounts a ON c.customer_id = a.customer_id
GROUP BY c.customer_id, c.name
ORDER BY total_balance DESC
LIMIT 10"#,
        columns: &["customer_id", "name", "total_balance"],
    },
    Insight {
        id: 4,
        question: "Which customers opened accounts in 2023 with a balance above 1,00,000?",
        sql: r#"SELECT c.customer_id, c.name, a.account_balance, c.join_date
FROM customers c
JOIN accounts a ON c.customer_id = a.customer_id
WHERE strftime('%Y', c.join_date) = '2023'
  AND a.account_balance > 100000"#,
        columns: &["customer_id", "name", "account_balance", "join_date"],
    },
    Insight {
        id: 5,
        question: "What is the total transaction volume (sum of amounts) by transaction type?",
        sql: r#"SELECT txn_type, SUM(amount) AS total_transaction_volume
FROM transactions
GROUP BY txn_type
ORDER BY total_transaction_volume DESC"#,
        columns: &["txn_type", "total_transaction_volume"],
    },
    Insight {
        id: 6,
        question: "Which accounts have more than 3 failed transactions in a single month?",
        sql: r#"SELECT customer_id, strftime('%Y-%m', txn_time) AS year_month, COUNT(*) AS failed_count
FROM transactions
WHERE status = 'failed'
GROUP BY customer_id, year_month
HAVING COUNT(*) > 3"#,
        columns: &["customer_id", "year_month", "failed_count"],
    },
    Insight {
        id: 7,
        question: "Which are the top 5 branches by total transaction volume in the last 6 months?",
        sql: r#"SELECT b.branch_name, SUM(t.amount) AS total_transaction_volume
FROM transactions t
JOIN customers c ON t.customer_id = c.customer_id
JOIN branches b ON c.city = b.city
WHERE t.txn_time >= date('now', '-6 months')
GROUP BY b.branch_name
ORDER BY total_transaction_volume DESC
LIMIT 5"#,
        columns: &["branch_name", "total_transaction_volume"],
    },
    Insight {
        id: 8,
        question: "Which accounts have 5 or more high-value transactions above 2,00,000?",
        sql: r#"SELECT customer_id, COUNT(*) AS high_value_txn_count
FROM transactions
WHERE amount > 200000
GROUP BY customer_id
HAVING COUNT(*) >= 5"#,
        columns: &["customer_id", "high_value_txn_count"],
    },
    Insight {
        id: 9,
        question: "What is the average loan amount and interest rate by loan type?",
        sql: r#"SELECT loan_type, AVG(loan_amount) AS avg_loan, AVG(interest_rate) AS avg_interest_rate
FROM loans
GROUP BY loan_type"#,
        columns: &["loan_type", "avg_loan", "avg_interest_rate"],
    },
    Insight {
        id: 10,
        question: "Which customers currently hold more than one active or approved loan?",
        sql: r#"SELECT customer_id, COUNT(*) AS loan_count
FROM loans
WHERE loan_status IN ('Active', 'Approved')
GROUP BY customer_id
HAVING COUNT(*) > 1"#,
        columns: &["customer_id", "loan_count"],
    },
    Insight {
        id: 11,
        question: "Who are the top 5 customers with the highest outstanding (non-closed) loan amounts?",
        sql: r#"SELECT customer_id, SUM(loan_amount) AS total_outstanding
FROM loans
WHERE loan_status != 'Closed'
GROUP BY customer_id
ORDER BY total_outstanding DESC
LIMIT 5"#,
        columns: &["customer_id", "total_outstanding"],
    },
    Insight {
        id: 12,
        question: "Which branch holds the highest total account balance?",
        sql: r#"SELECT b.branch_name, SUM(a.account_balance) AS total_account_balance
FROM accounts a
JOIN customers c ON a.customer_id = c.customer_id
JOIN branches b ON c.city = b.city
GROUP BY b.branch_name
ORDER BY total_account_balance DESC
LIMIT 1"#,
        columns: &["branch_name", "total_account_balance"],
    },
    Insight {
        id: 13,
        question: "What is the branch performance summary of customers, loans and transaction volume?",
        sql: r#"SELECT b.branch_name,
       COUNT(DISTINCT c.customer_id) AS total_customers,
       COUNT(DISTINCT l.loan_id) AS total_loans,
       SUM(t.amount) AS total_transaction_volume
FROM branches b
LEFT JOIN customers c ON b.city = c.city
LEFT JOIN loans l ON c.customer_id = l.customer_id
LEFT JOIN transactions t ON c.customer_id = t.customer_id
GROUP BY b.branch_name
ORDER BY b.branch_name"#,
        columns: &[
            "branch_name",
            "total_customers",
            "total_loans",
            "total_transaction_volume",
        ],
    },
    Insight {
        id: 14,
        question: "Which issue categories have the longest average resolution time?",
        sql: r#"SELECT issue_category,
       AVG(julianday(date_closed) - julianday(date_opened)) AS avg_resolution_days
FROM support_tickets
WHERE date_closed IS NOT NULL
GROUP BY issue_category
ORDER BY avg_resolution_days DESC"#,
        columns: &["issue_category", "avg_resolution_days"],
    },
    Insight {
        id: 15,
        question: "Which support agents resolved the most critical tickets with customer ratings of 4 or more?",
        sql: r#"SELECT support_agent,
       COUNT(*) AS resolved_critical_high_rating_tickets
FROM support_tickets
WHERE priority = 'Critical' AND customer_rating >= 4 AND status IN ('Resolved', 'Closed')
GROUP BY support_agent
ORDER BY resolved_critical_high_rating_tickets DESC"#,
        columns: &["support_agent", "resolved_critical_high_rating_tickets"],
    },
];

pub fn catalog() -> &'static [Insight] {
    CATALOG
}

pub fn find(id: u32) -> Option<&'static Insight> {
    CATALOG.iter().find(|i| i.id == id)
}

pub async fn run<C>(db: &C, id: u32) -> Result<InsightResult>
where
    C: ConnectionTrait,
{
    let insight = *find(id).ok_or_else(|| EngineError::NotFound(format!("insight {}", id)))?;
    let stmt = Statement::from_string(db.get_database_backend(), insight.sql.to_owned());
    let rows = db.query_all(stmt).await?;
    let columns = insight.columns.iter().map(|c| c.to_string()).collect();

    Ok(InsightResult {
        insight,
        rows: ResultSet::from_rows(columns, rows)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{exec, memory_db};
    use crate::db::Cell;

    #[test]
    fn test_catalog_ids() {
        let ids: Vec<u32> = catalog().iter().map(|i| i.id).collect();
        assert_eq!(ids, (1..=15).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_every_insight_runs_on_empty_store() {
        let db = memory_db().await;
        for insight in catalog() {
            let res = run(&db, insight.id).await;
            assert!(res.is_ok(), "insight {} failed: {:?}", insight.id, res.err());
        }
    }

    #[tokio::test]
    async fn test_failed_transactions_per_month() {
        let db = memory_db().await;
        for i in 0..5 {
            exec(
                &db,
                &format!(
                    "INSERT INTO transactions (txn_id, customer_id, txn_type, amount, txn_time, status) \
                     VALUES ('T{i}', 'C100', 'debit', 10, '2024-03-0{} 10:00:00', 'failed')",
                    i + 1
                ),
            )
            .await;
        }
        exec(
            &db,
            "INSERT INTO transactions (txn_id, customer_id, txn_type, amount, txn_time, status) \
             VALUES ('T9', 'C200', 'debit', 10, '2024-03-01 10:00:00', 'failed')",
        )
        .await;

        let res = run(&db, 6).await.unwrap();
        assert_eq!(
            res.rows.rows,
            vec![vec![
                Cell::Text("C100".into()),
                Cell::Text("2024-03".into()),
                Cell::Integer(5)
            ]]
        );
    }

    #[tokio::test]
    async fn test_unknown_insight() {
        let db = memory_db().await;
        assert!(matches!(run(&db, 99).await, Err(EngineError::NotFound(_))));
    }
}
