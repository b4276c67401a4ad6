pub mod account;
pub mod branch;
pub mod credit_card;
pub mod customer;
pub mod loan;
pub mod support_ticket;
pub mod transaction;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The schema-of-record tables. Anything else found in the catalog is handled
/// as a dynamic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TableKind {
    Customers,
    Accounts,
    Transactions,
    Branches,
    Loans,
    SupportTickets,
    CreditCards,
}

impl TableKind {
    pub fn from_table_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Column used to target a single row for update and delete.
    pub fn identity_column(&self) -> &'static str {
        match self {
            TableKind::Customers => "customer_id",
            TableKind::Accounts => "customer_id",
            TableKind::Transactions => "txn_id",
            TableKind::Branches => "branch_id",
            TableKind::Loans => "loan_id",
            TableKind::SupportTickets => "ticket_id",
            TableKind::CreditCards => "card_id",
        }
    }
}
