//! Scripted in-memory session for tests

use super::session::{DirectorySession, SearchCursor};
use super::types::{DirectoryEntry, SearchOptions};
use async_trait::async_trait;
use dirgroups_core::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Step {
    Entry(DirectoryEntry),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSearch {
    pub base: String,
    pub filter: String,
    pub options: SearchOptions,
}

/// Answers searches from a per-base script and records what was asked
#[derive(Default)]
pub struct ScriptedSession {
    scripts: HashMap<String, Vec<Step>>,
    rejected: HashMap<String, String>,
    close_failures: HashMap<String, String>,
    pub searches: Vec<RecordedSearch>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(mut self, base: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.scripts
            .insert(base.to_string(), entries.into_iter().map(Step::Entry).collect());
        self
    }

    pub fn with_steps(mut self, base: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(base.to_string(), steps);
        self
    }

    /// Fail the search request itself, before any cursor exists
    pub fn rejecting(mut self, base: &str, message: &str) -> Self {
        self.rejected.insert(base.to_string(), message.to_string());
        self
    }

    /// Make closing any cursor on `base` fail
    pub fn failing_close(mut self, base: &str, message: &str) -> Self {
        self.close_failures.insert(base.to_string(), message.to_string());
        self
    }

    pub fn searched_bases(&self) -> Vec<&str> {
        self.searches.iter().map(|s| s.base.as_str()).collect()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectorySession for ScriptedSession {
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        options: &SearchOptions,
    ) -> Result<Box<dyn SearchCursor + '_>> {
        self.searches.push(RecordedSearch {
            base: base.to_string(),
            filter: filter.to_string(),
            options: options.clone(),
        });

        if let Some(message) = self.rejected.get(base) {
            return Err(Error::search(base, message));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        let steps = self.scripts.get(base).cloned().unwrap_or_default();
        Ok(Box::new(ScriptedCursor {
            base: base.to_string(),
            steps: steps.into(),
            close_failure: self.close_failures.get(base).cloned(),
            closed: self.closed.clone(),
        }))
    }
}

struct ScriptedCursor {
    base: String,
    steps: VecDeque<Step>,
    close_failure: Option<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl SearchCursor for ScriptedCursor {
    async fn next_entry(&mut self) -> Result<Option<DirectoryEntry>> {
        match self.steps.pop_front() {
            Some(Step::Entry(entry)) => Ok(Some(entry)),
            Some(Step::Fail(message)) => Err(Error::search(&self.base, message)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        match &self.close_failure {
            Some(message) => Err(Error::search(&self.base, message)),
            None => Ok(()),
        }
    }
}
