pub mod connection;
pub mod gateway;
pub mod protocol;
