pub mod connection;
pub mod migrations;
pub mod models;
