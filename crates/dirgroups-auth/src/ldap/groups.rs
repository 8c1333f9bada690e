//! Group membership lookup
//!
//! Resolves a username to its DN, builds the membership filter and collects
//! the group name attribute from every configured group search base.

use super::filter::{compose_group_filter, membership_value};
use super::resolver::{NameResolver, SearchNameResolver};
use super::session::{search_entries, DirectorySession};
use super::types::SearchOptions;
use dirgroups_core::{LdapConfig, Result};
use tracing::{debug, info_span, Instrument};

/// Everything a lookup needs from the caller's side of the connection.
///
/// The session stays owned by the caller and is only borrowed for the call.
pub struct LdapConnection<'a> {
    pub session: &'a mut dyn DirectorySession,
    pub config: &'a LdapConfig,
    /// Identifies the calling service in log output
    pub service_id: &'a str,
}

impl<'a> LdapConnection<'a> {
    pub fn new(
        session: &'a mut dyn DirectorySession,
        config: &'a LdapConfig,
        service_id: &'a str,
    ) -> Self {
        Self {
            session,
            config,
            service_id,
        }
    }
}

/// Looks up the groups of a user
#[derive(Debug, Clone, Default)]
pub struct GroupLookup<R = SearchNameResolver> {
    resolver: R,
}

impl GroupLookup {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: NameResolver> GroupLookup<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Self { resolver }
    }

    /// Names of all groups `username` is a member of.
    ///
    /// An unknown user has no groups. Fails before touching the directory if
    /// no membership attribute is configured.
    pub async fn get_groups(
        &self,
        conn: &mut LdapConnection<'_>,
        username: &str,
    ) -> Result<Vec<String>> {
        let span = info_span!("ldap_groups", service = %conn.service_id, username = %username);
        self.groups_of_user(conn, username).instrument(span).await
    }

    async fn groups_of_user(
        &self,
        conn: &mut LdapConnection<'_>,
        username: &str,
    ) -> Result<Vec<String>> {
        let config = conn.config;
        let membership_attribute = config.membership_attribute()?;

        let dn = match self
            .resolver
            .resolve(username, config, &mut *conn.session)
            .await?
        {
            Some(dn) => dn,
            None => return Ok(Vec::new()),
        };

        let value = membership_value(&dn, membership_attribute)?;
        let filter =
            compose_group_filter(&config.group_name_list_filter, membership_attribute, &value);

        debug!(
            "Reading roles with the membership property '{}'",
            membership_attribute
        );

        collect_group_names(
            &mut *conn.session,
            &config.group_search_base,
            &filter,
            &config.group_name_attribute,
        )
        .await
    }
}

/// Run `filter` below every base in order and collect all values of
/// `attribute`, in base, entry and value order. Nothing is sorted or
/// deduplicated. The first failing base aborts the whole collection.
pub async fn collect_group_names<S>(
    session: &mut S,
    bases: &[String],
    filter: &str,
    attribute: &str,
) -> Result<Vec<String>>
where
    S: DirectorySession + ?Sized,
{
    debug!(
        "Result for search-base: {:?}, search-filter: '{}', property: '{}'",
        bases, filter, attribute
    );

    let options = SearchOptions::subtree([attribute]);
    let mut names = Vec::new();

    for base in bases {
        search_entries(&mut *session, base, filter, &options, |entry| {
            if !entry.has_attributes() {
                return;
            }
            if let Some(values) = entry.values(attribute) {
                for name in values {
                    debug!("Found the group '{}'", name);
                    names.push(name.clone());
                }
            }
        })
        .await?;
    }

    debug!("Found {} groups for user", names.len());
    Ok(names)
}

/// Convenience wrapper using the default search based resolver
pub async fn get_groups(conn: &mut LdapConnection<'_>, username: &str) -> Result<Vec<String>> {
    GroupLookup::new().get_groups(conn, username).await
}
