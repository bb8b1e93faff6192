pub use sea_orm_migration::prelude::*;

mod m20251102_000001_initial;
mod m20251110_000001_add_notifications;
mod m20251118_000001_add_admins;
mod m20251125_000001_add_streak_fields;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251102_000001_initial::Migration),
            Box::new(m20251110_000001_add_notifications::Migration),
            Box::new(m20251118_000001_add_admins::Migration),
            Box::new(m20251125_000001_add_streak_fields::Migration),
        ]
    }
}
