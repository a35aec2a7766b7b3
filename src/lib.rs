pub mod db;
pub mod directory;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod utils;
