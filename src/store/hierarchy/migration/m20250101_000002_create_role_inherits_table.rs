use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleInherits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleInherits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoleInherits::RoleCode).string().not_null())
                    .col(
                        ColumnDef::new(RoleInherits::InheritCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoleInherits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_inherits_edge")
                    .table(RoleInherits::Table)
                    .col(RoleInherits::RoleCode)
                    .col(RoleInherits::InheritCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_inherits_role_code")
                    .table(RoleInherits::Table)
                    .col(RoleInherits::RoleCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleInherits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RoleInherits {
    Table,
    Id,
    RoleCode,
    InheritCode,
    CreatedAt,
}
