mod accounts;
mod journal_entries;
mod tenants;

pub use accounts::{AccountPersistenceError, AccountRepo, DynAccountRepo};
pub use journal_entries::{
    DynJournalEntryRepo, JournalEntryQuery, JournalEntryRepo, PostEntryError,
};
pub use tenants::{DynTenantRepo, TenantPersistenceError, TenantRepo};
