use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "support_tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ticket_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub loan_id: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    pub issue_category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date_opened: Date,
    #[serde(default)]
    pub date_closed: Option<Date>,
    pub priority: String,
    pub status: String,
    #[serde(default)]
    pub resolution_remarks: Option<String>,
    #[serde(default)]
    pub support_agent: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub customer_rating: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
