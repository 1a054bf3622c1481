pub mod auth;
pub mod init;
pub mod schedule;
pub mod sync;
