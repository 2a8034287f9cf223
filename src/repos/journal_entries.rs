use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    database::MemoryDatabase,
    ledger::domain::journal_entries::{EntryStatus, JournalEntry, NewJournalEntry},
};

/// Query parameters for listing journal entries.
#[derive(Clone, Debug, Default)]
pub struct JournalEntryQuery {
    /// The owner of the entries to search for.
    pub tenant_id: Uuid,
    /// Only list entries dated on or after this date.
    pub from: Option<NaiveDate>,
    /// Only list entries dated on or before this date.
    pub to: Option<NaiveDate>,
    /// Only list entries with at least one line that uses the account with
    /// this code.
    pub account: Option<String>,
    pub status: Option<EntryStatus>,
}

impl JournalEntryQuery {
    pub fn for_tenant(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            ..Default::default()
        }
    }

    fn matches(&self, entry: &JournalEntry) -> bool {
        self.from.map_or(true, |from| entry.date >= from)
            && self.to.map_or(true, |to| entry.date <= to)
            && self.status.map_or(true, |status| entry.status == status)
            && self
                .account
                .as_deref()
                .map_or(true, |account| entry.touches_account(account))
    }
}

#[derive(Debug, Error)]
pub enum PostEntryError {
    #[error("journal entry not found")]
    NotFound,

    #[error("journal entry {0} has already been posted")]
    AlreadyPosted(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynJournalEntryRepo = Arc<dyn JournalEntryRepo + Send + Sync>;

#[async_trait]
pub trait JournalEntryRepo {
    /// Store a new entry as a draft, assigning it an ID and the next entry
    /// number for its tenant.
    async fn persist_entry(&self, entry: NewJournalEntry) -> anyhow::Result<JournalEntry>;

    async fn get_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> anyhow::Result<Option<JournalEntry>>;

    /// List the entries matching the provided query, newest first.
    ///
    /// # Arguments
    ///
    /// * `query` - The query parameters used to filter the list.
    async fn list_entries(&self, query: JournalEntryQuery) -> anyhow::Result<Vec<JournalEntry>>;

    /// Mark a draft entry as posted. Posted entries cannot be posted again.
    async fn mark_posted(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<JournalEntry, PostEntryError>;
}

fn entry_number(sequence: usize) -> String {
    format!("JE-{:06}", sequence)
}

#[async_trait]
impl JournalEntryRepo for MemoryDatabase {
    async fn persist_entry(&self, entry: NewJournalEntry) -> anyhow::Result<JournalEntry> {
        let mut store = self.write().await;

        let entries = store
            .journal_entries
            .get_mut(&entry.tenant_id())
            .with_context(|| format!("No ledger for tenant {}.", entry.tenant_id()))?;

        let now = Utc::now();
        let saved = JournalEntry {
            id: Uuid::new_v4(),
            tenant_id: entry.tenant_id(),
            entry_number: entry_number(entries.len() + 1),
            date: entry.date(),
            description: entry.description().to_owned(),
            reference: entry.reference().map(String::from),
            status: EntryStatus::Draft,
            lines: entry.lines().to_vec(),
            created_at: now,
            updated_at: now,
        };

        entries.push(saved.clone());

        Ok(saved)
    }

    async fn get_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> anyhow::Result<Option<JournalEntry>> {
        let store = self.read().await;

        Ok(store
            .journal_entries
            .get(&tenant_id)
            .and_then(|entries| entries.iter().find(|entry| entry.id == entry_id))
            .cloned())
    }

    async fn list_entries(&self, query: JournalEntryQuery) -> anyhow::Result<Vec<JournalEntry>> {
        let store = self.read().await;

        let mut entries: Vec<JournalEntry> = store
            .journal_entries
            .get(&query.tenant_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| query.matches(entry))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Entries are stored in the order they were numbered. Reversing first
        // keeps later entries ahead within a date, since the sort is stable.
        entries.reverse();
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(entries)
    }

    async fn mark_posted(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<JournalEntry, PostEntryError> {
        let mut store = self.write().await;

        let entry = store
            .journal_entries
            .get_mut(&tenant_id)
            .and_then(|entries| entries.iter_mut().find(|entry| entry.id == entry_id))
            .ok_or(PostEntryError::NotFound)?;

        if entry.is_posted() {
            return Err(PostEntryError::AlreadyPosted(entry.entry_number.clone()));
        }

        entry.status = EntryStatus::Posted;
        entry.updated_at = Utc::now();

        Ok(entry.clone())
    }
}
