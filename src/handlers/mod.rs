pub mod admin;
pub mod auth;
pub mod leaderboard;
pub mod notification;
pub mod streak;
pub mod submission;
pub mod user;

pub use admin::admin_config;
pub use auth::auth_config;
pub use leaderboard::leaderboard_config;
pub use notification::notification_config;
pub use streak::streak_config;
pub use submission::submission_config;
pub use user::user_config;
