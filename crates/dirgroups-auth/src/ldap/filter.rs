//! Group membership filter construction
//!
//! The membership test value is either the bare uid of the user (POSIX
//! groups, `memberUid`) or the user's full DN with each RDN escaped for use
//! inside a search filter.
//!
//! The RDN escaping is deliberately narrower than RFC 4515: a bare `*` is
//! passed through so configured values can still act as wildcards, and a
//! backslash directly followed by `*` is read as an already escaped
//! asterisk. `/` and surrounding whitespace are not touched either.

use super::dn::DistinguishedName;
use dirgroups_core::{Error, LdapConfig, Result, MEMBER_UID};
use tracing::debug;

/// Escape filter metacharacters in one DN component
pub fn escape_filter_component(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    escaped.push_str("\\2a");
                } else {
                    escaped.push_str("\\5c");
                }
            }
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Rebuild a DN for use as a filter value, escaping each RDN separately
pub fn escape_dn_for_filter(dn: &DistinguishedName) -> String {
    let escaped = dn
        .rdns()
        .iter()
        .map(|rdn| escape_filter_component(&rdn.to_string()))
        .collect::<Vec<_>>()
        .join(",");

    debug!("Escaped DN value for filter '{}'", escaped);
    escaped
}

/// Value that identifies `dn` in the given membership attribute
pub fn membership_value(dn: &DistinguishedName, membership_attribute: &str) -> Result<String> {
    if membership_attribute == MEMBER_UID {
        // posixGroup members are listed by uid, not DN
        let leaf = dn
            .leaf()
            .ok_or_else(|| Error::invalid_name(dn.to_string(), "empty name has no uid"))?;
        Ok(leaf.value().to_string())
    } else {
        Ok(escape_dn_for_filter(dn))
    }
}

/// `(&<group filter>(<membership attribute>=<value>))`
pub fn compose_group_filter(
    group_name_list_filter: &str,
    membership_attribute: &str,
    membership_value: &str,
) -> String {
    format!(
        "(&{}({}={}))",
        group_name_list_filter, membership_attribute, membership_value
    )
}

/// Build the group search filter for a resolved user
pub fn build_group_filter(config: &LdapConfig, dn: &DistinguishedName) -> Result<String> {
    let membership_attribute = config.membership_attribute()?;
    let value = membership_value(dn, membership_attribute)?;

    Ok(compose_group_filter(
        &config.group_name_list_filter,
        membership_attribute,
        &value,
    ))
}
