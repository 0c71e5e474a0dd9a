use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Reactions {
    Table,
    Id,
    UserId,
    TargetType,
    TargetId,
    Value,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reactions::UserId).integer().not_null())
                    .col(ColumnDef::new(Reactions::TargetType).string().not_null())
                    .col(ColumnDef::new(Reactions::TargetId).integer().not_null())
                    .col(ColumnDef::new(Reactions::Value).small_integer().not_null())
                    .col(
                        ColumnDef::new(Reactions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_user_id")
                            .from(Reactions::Table, Reactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One reaction per user per target; the upsert path relies on this.
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_user_target")
                    .table(Reactions::Table)
                    .col(Reactions::UserId)
                    .col(Reactions::TargetType)
                    .col(Reactions::TargetId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Like-count queries scan by target.
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_target")
                    .table(Reactions::Table)
                    .col(Reactions::TargetType)
                    .col(Reactions::TargetId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reactions::Table).to_owned())
            .await
    }
}
