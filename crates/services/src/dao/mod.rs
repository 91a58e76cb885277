pub mod base;
pub mod collaboration;
pub mod post;
pub mod user;

pub use base::BaseDao;
pub use collaboration::CollaborationDao;
pub use post::PostDao;
pub use user::UserDao;
