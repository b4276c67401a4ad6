use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub card_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    pub card_type: String,
    #[serde(default)]
    pub card_network: Option<String>,
    pub credit_limit: f64,
    pub current_balance: f64,
    #[serde(default)]
    pub issued_date: Option<Date>,
    #[serde(default)]
    pub expiry_date: Option<Date>,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
