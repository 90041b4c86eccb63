//! Database layer
//!
//! Tasks are stored in SQLite by default or MySQL when configured. Schema
//! changes live in [`migrations`] and are applied at startup.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, mysql_pool, sqlite_pool, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
