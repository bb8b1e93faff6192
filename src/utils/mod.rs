pub mod jwt;
pub mod password;
pub mod points;
pub mod time_window;

pub use jwt::*;
pub use password::*;
pub use points::*;
pub use time_window::*;
