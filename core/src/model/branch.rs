use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "branches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub branch_id: String,
    pub branch_name: String,
    pub city: String,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub total_employees: Option<i32>,
    #[serde(default)]
    pub branch_revenue: Option<f64>,
    #[serde(default)]
    pub opening_date: Option<Date>,
    #[serde(default)]
    pub performance_rating: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
