use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    TotalPoints,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    UserId,
    ActionType,
    ImageUrl,
    WorkflowId,
    PlatformDetected,
    LikeDetected,
    CommentDetected,
    RepostDetected,
    TagDetected,
    OriginalPostDetected,
    PrimaryAction,
    AssignedPoints,
    ActionConfidence,
    DuplicateRisk,
    ContentQualityPass,
    Status,
    PointsAwarded,
    Notes,
    AdminNotes,
    SubmittedAt,
    VerifiedAt,
}

#[derive(DeriveIden)]
enum MonthlyPoints {
    Table,
    Id,
    UserId,
    Month,
    Points,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::TotalPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::ActionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::ImageUrl).string().not_null())
                    .col(ColumnDef::new(Submissions::WorkflowId).string_len(128))
                    .col(ColumnDef::new(Submissions::PlatformDetected).string_len(64))
                    .col(ColumnDef::new(Submissions::LikeDetected).boolean())
                    .col(ColumnDef::new(Submissions::CommentDetected).boolean())
                    .col(ColumnDef::new(Submissions::RepostDetected).boolean())
                    .col(ColumnDef::new(Submissions::TagDetected).boolean())
                    .col(ColumnDef::new(Submissions::OriginalPostDetected).boolean())
                    .col(ColumnDef::new(Submissions::PrimaryAction).string_len(64))
                    .col(ColumnDef::new(Submissions::AssignedPoints).big_integer())
                    .col(ColumnDef::new(Submissions::ActionConfidence).double())
                    .col(ColumnDef::new(Submissions::DuplicateRisk).string_len(16))
                    .col(ColumnDef::new(Submissions::ContentQualityPass).boolean())
                    .col(
                        ColumnDef::new(Submissions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Submissions::PointsAwarded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Submissions::Notes).text())
                    .col(ColumnDef::new(Submissions::AdminNotes).text())
                    .col(
                        ColumnDef::new(Submissions::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(ColumnDef::new(Submissions::VerifiedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_user_status")
                    .table(Submissions::Table)
                    .col(Submissions::UserId)
                    .col(Submissions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MonthlyPoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlyPoints::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MonthlyPoints::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyPoints::Month)
                            .string_len(7)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyPoints::Points)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MonthlyPoints::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(MonthlyPoints::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_monthly_points_user_month")
                    .table(MonthlyPoints::Table)
                    .col(MonthlyPoints::UserId)
                    .col(MonthlyPoints::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MonthlyPoints::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
