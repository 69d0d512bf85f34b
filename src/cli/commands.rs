pub mod generate_returns;
pub mod initdb;
pub mod migrate_and_serve;
pub mod seed;
pub mod serve;

pub use generate_returns::generate_returns;
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use seed::seed;
pub use serve::serve;
