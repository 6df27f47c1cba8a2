pub mod user;
pub mod listing;
pub mod application;
pub mod notification;
pub mod developer_profile;

pub use user::*;
pub use listing::*;
pub use application::*;
pub use notification::*;
pub use developer_profile::*;
