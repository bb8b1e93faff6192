pub mod common;
pub mod leaderboard;
pub mod notification;
pub mod pagination;
pub mod streak;
pub mod submission;
pub mod user;

pub use common::*;
pub use leaderboard::*;
pub use notification::*;
pub use pagination::*;
pub use streak::*;
pub use submission::*;
pub use user::*;
