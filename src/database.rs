use std::{collections::HashMap, ops::Deref, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    ledger::domain::{accounts::ChartOfAccounts, journal_entries::JournalEntry},
    tenants::domain::tenants::Tenant,
};

/// Everything the application stores, keyed by tenant.
#[derive(Debug, Default)]
pub struct Store {
    pub(crate) tenants: Vec<Tenant>,
    pub(crate) charts: HashMap<Uuid, ChartOfAccounts>,
    pub(crate) journal_entries: HashMap<Uuid, Vec<JournalEntry>>,
}

/// A shared handle to an in-memory store. Clones refer to the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase(Arc<RwLock<Store>>);

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for MemoryDatabase {
    type Target = RwLock<Store>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
