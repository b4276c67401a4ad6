use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub loan_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    pub loan_type: String,
    pub loan_amount: f64,
    pub interest_rate: f64,
    #[serde(default)]
    pub loan_term_months: Option<i32>,
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub end_date: Option<Date>,
    pub loan_status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
