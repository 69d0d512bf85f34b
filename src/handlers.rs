pub mod content;
pub mod customers;
pub mod declarations;
pub mod health;
pub mod lookups;
pub mod tax_returns;
