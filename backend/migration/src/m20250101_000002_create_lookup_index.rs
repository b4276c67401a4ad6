use banksight_core::model::{credit_card, loan, support_ticket, transaction};
use sea_orm_migration::prelude::*;

use crate::{index_name, lookup_index};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(lookup_index!(
                transaction::Entity,
                transaction::Column::CustomerId,
                transaction::Column::Status
            ))
            .await?;
        manager
            .create_index(lookup_index!(loan::Entity, loan::Column::CustomerId))
            .await?;
        manager
            .create_index(lookup_index!(
                support_ticket::Entity,
                support_ticket::Column::CustomerId
            ))
            .await?;
        manager
            .create_index(lookup_index!(
                credit_card::Entity,
                credit_card::Column::CustomerId
            ))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            (
                index_name!(
                    transaction::Entity,
                    transaction::Column::CustomerId,
                    transaction::Column::Status
                ),
                "transactions",
            ),
            (index_name!(loan::Entity, loan::Column::CustomerId), "loans"),
            (
                index_name!(support_ticket::Entity, support_ticket::Column::CustomerId),
                "support_tickets",
            ),
            (
                index_name!(credit_card::Entity, credit_card::Column::CustomerId),
                "credit_cards",
            ),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
