pub mod cli;
mod cors;
pub mod database;
pub mod http_err;
pub mod ledger;
pub mod repos;
pub mod server;
pub mod tenants;
