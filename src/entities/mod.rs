pub mod admins;
pub mod monthly_points;
pub mod notifications;
pub mod submissions;
pub mod users;

pub use admins as admin_entity;
pub use monthly_points as monthly_points_entity;
pub use notifications as notification_entity;
pub use submissions as submission_entity;
pub use users as user_entity;
