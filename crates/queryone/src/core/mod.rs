pub mod connection;
pub mod driver;
pub mod format;
pub mod limits;
pub mod observer;
pub mod query;
pub mod types;
pub mod worker;
