pub mod connection;
pub mod presence;
