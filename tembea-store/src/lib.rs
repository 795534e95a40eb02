pub mod app_config;
pub mod database;
pub mod feed;
pub mod memory;
pub mod pg;

pub use database::DbClient;
pub use feed::ChangeFeed;
pub use memory::MemoryRemoteClient;
pub use pg::PgRemoteClient;
