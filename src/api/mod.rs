pub mod server;
pub mod users;
