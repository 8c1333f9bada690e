//! Username to distinguished name resolution

use super::dn::DistinguishedName;
use super::session::{search_entries, DirectorySession};
use super::types::SearchOptions;
use async_trait::async_trait;
use dirgroups_core::{LdapConfig, Result};
use ldap3::ldap_escape;
use tracing::{debug, warn};

/// Finds the directory identity of a username.
///
/// `Ok(None)` means the user does not exist, which is not an error.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(
        &self,
        username: &str,
        config: &LdapConfig,
        session: &mut dyn DirectorySession,
    ) -> Result<Option<DistinguishedName>>;
}

/// Resolves by searching the configured user search bases in order.
/// The first matching entry wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchNameResolver;

impl SearchNameResolver {
    /// Build user search filter with escaped username substitution
    pub fn user_filter(config: &LdapConfig, username: &str) -> String {
        config
            .user_name_search_filter
            .replace("{username}", &ldap_escape(username))
    }
}

#[async_trait]
impl NameResolver for SearchNameResolver {
    async fn resolve(
        &self,
        username: &str,
        config: &LdapConfig,
        session: &mut dyn DirectorySession,
    ) -> Result<Option<DistinguishedName>> {
        let filter = Self::user_filter(config, username);
        let options = SearchOptions::subtree([config.user_name_attribute.as_str()]);

        debug!("Searching for user with filter: {}", filter);

        for base in &config.user_search_base {
            let mut found: Option<String> = None;
            let mut extra = 0usize;

            search_entries(&mut *session, base, &filter, &options, |entry| {
                if found.is_none() {
                    found = Some(entry.dn);
                } else {
                    extra += 1;
                }
            })
            .await?;

            if let Some(dn) = found {
                if extra > 0 {
                    warn!(
                        "Username '{}' matched {} entries under '{}', using '{}'",
                        username,
                        extra + 1,
                        base,
                        dn
                    );
                }
                debug!("Found user DN: {}", dn);
                return DistinguishedName::parse(&dn).map(Some);
            }
        }

        debug!("No entry found for user '{}'", username);
        Ok(None)
    }
}
