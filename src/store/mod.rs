pub mod mysql;

pub use mysql::MySqlLeaveBackend;
