//! LDAP group membership resolution
//!
//! Provides:
//! - Username to DN resolution
//! - Group filter construction for DN and POSIX (`memberUid`) membership
//! - Group name collection across multiple search bases
//! - An ldap3 backed session (LDAP, LDAPS, STARTTLS)

mod client;
mod dn;
mod filter;
mod groups;
mod resolver;
mod session;
mod types;

#[cfg(test)]
mod testing;

pub use client::LdapSession;
pub use dn::{AttributeTypeAndValue, DistinguishedName, Rdn};
pub use filter::{
    build_group_filter, compose_group_filter, escape_dn_for_filter, escape_filter_component,
    membership_value,
};
pub use groups::{collect_group_names, get_groups, GroupLookup, LdapConnection};
pub use resolver::{NameResolver, SearchNameResolver};
pub use session::{search_entries, DirectorySession, SearchCursor};
pub use types::*;
