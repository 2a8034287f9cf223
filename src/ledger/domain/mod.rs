pub mod accounts;
pub mod balance;
pub mod currency;
pub mod draft;
pub mod journal_entries;
pub mod reports;
