use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    CurrentStreak,
    LongestStreak,
    GraceDayUsed,
    GraceDayDate,
    LastActivityDate,
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    StreakMultiplier,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Streak cache columns on users plus the per-submission multiplier snapshot.
///
/// The users columns are a cache of the streak recompute; the source of truth
/// stays the verified submission history. GraceDayDate / LastActivityDate hold
/// local-day labels (YYYY-MM-DD), not instants, because the streak walk is
/// defined over timezone-adjusted calendar days.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(
                        ColumnDef::new(Users::CurrentStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(
                        ColumnDef::new(Users::LongestStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(
                        ColumnDef::new(Users::GraceDayUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(ColumnDef::new(Users::GraceDayDate).string_len(10))
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(ColumnDef::new(Users::LastActivityDate).string_len(10))
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Submissions::Table)
                    .add_column(
                        ColumnDef::new(Submissions::StreakMultiplier)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Submissions::Table)
                    .drop_column(Submissions::StreakMultiplier)
                    .to_owned(),
            )
            .await?;
        for col in [
            Users::LastActivityDate,
            Users::GraceDayDate,
            Users::GraceDayUsed,
            Users::LongestStreak,
            Users::CurrentStreak,
        ] {
            manager
                .alter_table(Table::alter().table(Users::Table).drop_column(col).to_owned())
                .await?;
        }
        Ok(())
    }
}
