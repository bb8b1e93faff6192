pub mod admin_service;
pub mod auth_service;
pub mod leaderboard_service;
pub mod notification_service;
pub mod points_service;
pub mod streak_service;
pub mod submission_service;
pub mod user_service;
pub mod verdict;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use leaderboard_service::LeaderboardService;
pub use notification_service::NotificationService;
pub use points_service::PointsService;
pub use streak_service::StreakService;
pub use submission_service::SubmissionService;
pub use user_service::UserService;
