pub mod entry;
pub mod movie;
pub mod user;
