//! LDAP session over ldap3
//!
//! Handles connecting and binding with the service account, and exposes
//! streaming searches as [`SearchCursor`]s.
//! Supports LDAP, LDAPS (SSL), and STARTTLS connections.

use super::session::{DirectorySession, SearchCursor};
use super::types::{DirectoryEntry, SearchOptions};
use async_trait::async_trait;
use dirgroups_core::{Error, LdapConfig, Result};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, SearchEntry, SearchStream};
use std::time::Duration;
use tracing::{debug, warn};

/// An authenticated ldap3 connection
pub struct LdapSession {
    ldap: Ldap,
}

impl LdapSession {
    /// Connect and bind with the configured service account
    pub async fn connect(config: &LdapConfig) -> Result<Self> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(config.timeout_seconds))
            .set_starttls(config.start_tls)
            .set_no_tls_verify(config.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", config.server_url);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &config.server_url)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        ldap3::drive!(conn);

        let result = ldap
            .simple_bind(&config.bind_dn, &config.bind_password)
            .await
            .map_err(|e| Error::Bind(format!("Service bind failed: {}", e)))?;

        if result.rc != 0 {
            return Err(Error::Bind(format!(
                "Service account bind failed with code: {}",
                result.rc
            )));
        }

        Ok(Self { ldap })
    }

    pub async fn unbind(mut self) -> Result<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| Error::Directory(format!("Unbind failed: {}", e)))
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        options: &SearchOptions,
    ) -> Result<Box<dyn SearchCursor + '_>> {
        debug!("Searching '{}' with filter: {}", base, filter);

        let stream = self
            .ldap
            .streaming_search(
                base,
                options.scope.into(),
                filter,
                options.attributes.clone(),
            )
            .await
            .map_err(|e| Error::search(base, e))?;

        Ok(Box::new(LdapCursor {
            base: base.to_string(),
            stream,
            state: CursorState::Open,
        }))
    }
}

/// Where a cursor is in its life. Only an open cursor still has a search
/// running on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Open,
    Exhausted,
    Closed,
}

impl CursorState {
    fn needs_abandon(self) -> bool {
        self == CursorState::Open
    }
}

struct LdapCursor {
    base: String,
    stream: SearchStream<'static, String, Vec<String>>,
    state: CursorState,
}

#[async_trait]
impl SearchCursor for LdapCursor {
    async fn next_entry(&mut self) -> Result<Option<DirectoryEntry>> {
        loop {
            let next = self
                .stream
                .next()
                .await
                .map_err(|e| Error::search(&self.base, e))?;

            match next {
                None => {
                    self.state = CursorState::Exhausted;
                    return Ok(None);
                }
                // Referrals and intermediate messages carry no entry
                Some(entry) if entry.is_ref() || entry.is_intermediate() => continue,
                Some(entry) => return Ok(Some(SearchEntry::construct(entry).into())),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, CursorState::Closed);
        match state {
            CursorState::Closed => Ok(()),
            CursorState::Open => {
                debug!("Abandoning unfinished search on '{}'", self.base);
                let msgid = self.stream.ldap_handle().last_id();
                self.stream
                    .ldap_handle()
                    .abandon(msgid)
                    .await
                    .map_err(|e| Error::search(&self.base, e))?;
                // the result of an abandoned search is synthetic
                let _ = self.stream.finish().await;
                Ok(())
            }
            CursorState::Exhausted => self
                .stream
                .finish()
                .await
                .success()
                .map(|_| ())
                .map_err(|e| Error::search(&self.base, e)),
        }
    }
}

impl Drop for LdapCursor {
    /// A cursor dropped while open, for example because the lookup future was
    /// cancelled mid-search, still abandons its search on the server.
    fn drop(&mut self) {
        if !self.state.needs_abandon() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to abandon search on '{}'", self.base);
            return;
        };

        let mut ldap = self.stream.ldap_handle().clone();
        let msgid = ldap.last_id();
        let base = std::mem::take(&mut self.base);
        runtime.spawn(async move {
            if let Err(e) = ldap.abandon(msgid).await {
                warn!("Failed to abandon dropped search on '{}': {}", base, e);
            }
        });
    }
}
