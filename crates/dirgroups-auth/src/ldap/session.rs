//! Directory session abstraction
//!
//! A session is an already authenticated connection owned by the caller.
//! Searches hand back a cursor that must be closed once the caller is done
//! with it, whether or not it was read to the end.

use super::types::{DirectoryEntry, SearchOptions};
use async_trait::async_trait;
use dirgroups_core::Result;
use tracing::warn;

#[async_trait]
pub trait DirectorySession: Send {
    /// Start a search below `base`
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        options: &SearchOptions,
    ) -> Result<Box<dyn SearchCursor + '_>>;
}

#[async_trait]
pub trait SearchCursor: Send {
    /// Next entry, or `None` once the search is exhausted
    async fn next_entry(&mut self) -> Result<Option<DirectoryEntry>>;

    /// Release the search. Abandons it on the server if not exhausted.
    async fn close(&mut self) -> Result<()>;
}

/// Run one search, feeding every entry to `on_entry`.
///
/// The cursor is closed on every path. If reading fails the read error is
/// returned and a failing close is only logged.
pub async fn search_entries<S, F>(
    session: &mut S,
    base: &str,
    filter: &str,
    options: &SearchOptions,
    mut on_entry: F,
) -> Result<()>
where
    S: DirectorySession + ?Sized,
    F: FnMut(DirectoryEntry) + Send,
{
    let mut cursor = session.search(base, filter, options).await?;

    match drain(cursor.as_mut(), &mut on_entry).await {
        Ok(()) => cursor.close().await,
        Err(e) => {
            if let Err(close_err) = cursor.close().await {
                warn!("Failed to close search on '{}': {}", base, close_err);
            }
            Err(e)
        }
    }
}

async fn drain<F>(cursor: &mut (dyn SearchCursor + '_), on_entry: &mut F) -> Result<()>
where
    F: FnMut(DirectoryEntry) + Send,
{
    while let Some(entry) = cursor.next_entry().await? {
        on_entry(entry);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldap::testing::{ScriptedSession, Step};

    const BASE: &str = "ou=groups,dc=example,dc=com";

    #[tokio::test]
    async fn test_search_entries_drains_and_closes() {
        let mut session = ScriptedSession::new().with_entries(
            BASE,
            vec![
                DirectoryEntry::new("cn=a,ou=groups,dc=example,dc=com"),
                DirectoryEntry::new("cn=b,ou=groups,dc=example,dc=com"),
            ],
        );

        let mut dns = Vec::new();
        search_entries(
            &mut session,
            BASE,
            "(objectClass=*)",
            &SearchOptions::subtree(["cn"]),
            |entry| dns.push(entry.dn),
        )
        .await
        .unwrap();

        assert_eq!(dns.len(), 2);
        assert_eq!(session.opened(), 1);
        assert_eq!(session.closed(), 1);
    }

    #[tokio::test]
    async fn test_search_entries_closes_on_error() {
        let mut session = ScriptedSession::new().with_steps(
            BASE,
            vec![
                Step::Entry(DirectoryEntry::new("cn=a,ou=groups,dc=example,dc=com")),
                Step::Fail("connection reset".to_string()),
                Step::Entry(DirectoryEntry::new("cn=b,ou=groups,dc=example,dc=com")),
            ],
        );

        let mut seen = 0;
        let result = search_entries(
            &mut session,
            BASE,
            "(objectClass=*)",
            &SearchOptions::default(),
            |_| seen += 1,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(seen, 1);
        assert_eq!(session.closed(), 1);
    }

    #[tokio::test]
    async fn test_search_entries_rejected_request() {
        let mut session = ScriptedSession::new().rejecting(BASE, "Bad search filter");

        let result = search_entries(
            &mut session,
            BASE,
            "(broken",
            &SearchOptions::default(),
            |_| {},
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), "SearchFailed");
        assert_eq!(session.opened(), 0);
    }

    #[tokio::test]
    async fn test_search_entries_close_failure_fails_clean_drain() {
        let mut session = ScriptedSession::new()
            .with_entries(BASE, vec![DirectoryEntry::new("cn=a,ou=groups,dc=example,dc=com")])
            .failing_close(BASE, "rc=3 timeLimitExceeded");

        let mut seen = 0;
        let err = search_entries(
            &mut session,
            BASE,
            "(objectClass=*)",
            &SearchOptions::default(),
            |_| seen += 1,
        )
        .await
        .unwrap_err();

        assert_eq!(seen, 1);
        assert_eq!(err.code(), "SearchFailed");
        assert!(err.to_string().contains("timeLimitExceeded"));
        assert_eq!(session.closed(), 1);
    }

    #[tokio::test]
    async fn test_search_entries_read_error_wins_over_close_error() {
        let mut session = ScriptedSession::new()
            .with_steps(BASE, vec![Step::Fail("connection reset".to_string())])
            .failing_close(BASE, "abandon failed");

        let err = search_entries(
            &mut session,
            BASE,
            "(objectClass=*)",
            &SearchOptions::default(),
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("connection reset"));
        assert!(!err.to_string().contains("abandon failed"));
        assert_eq!(session.closed(), 1);
    }
}
