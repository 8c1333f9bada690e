//! Directory group lookup for dirgroups

pub mod ldap;

pub use ldap::{
    get_groups, DirectoryEntry, DirectorySession, DistinguishedName, GroupLookup,
    LdapConnection, LdapSession, NameResolver, SearchCursor, SearchNameResolver,
};
