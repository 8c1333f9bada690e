//! Configuration for dirgroups
//!
//! Example config:
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [ldap]
//! server_url = "ldap://ldap.example.com:389"
//! bind_dn = "cn=admin,dc=example,dc=com"
//! bind_password = "secret"
//! user_search_base = ["ou=users,dc=example,dc=com"]
//! group_search_base = ["ou=groups,dc=example,dc=com"]
//! membership_attribute = "member"
//! ```

use serde::{Deserialize, Serialize};

/// Attribute used by POSIX groups (`posixGroup`) to list members by uid.
pub const MEMBER_UID: &str = "memberUid";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirgroupsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ldap: LdapConfig,
}

impl DirgroupsConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields with `DIRGROUPS_*` environment variables when present
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(level) = var("DIRGROUPS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DIRGROUPS_LOG_FORMAT") {
            self.logging.format = format;
        }

        let ldap = &mut self.ldap;
        if let Some(url) = var("DIRGROUPS_LDAP_URL") {
            ldap.server_url = url;
        }
        if let Some(dn) = var("DIRGROUPS_LDAP_BIND_DN") {
            ldap.bind_dn = dn;
        }
        if let Some(password) = var("DIRGROUPS_LDAP_BIND_PASSWORD") {
            ldap.bind_password = password;
        }
        if var("DIRGROUPS_LDAP_START_TLS").map(|v| v == "true").unwrap_or(false) {
            ldap.start_tls = true;
        }
        if let Some(timeout) = var("DIRGROUPS_LDAP_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                ldap.timeout_seconds = t;
            }
        }
        if let Some(bases) = var("DIRGROUPS_LDAP_USER_SEARCH_BASE") {
            ldap.user_search_base = split_list(&bases);
        }
        if let Some(filter) = var("DIRGROUPS_LDAP_USER_FILTER") {
            ldap.user_name_search_filter = filter;
        }
        if let Some(bases) = var("DIRGROUPS_LDAP_GROUP_SEARCH_BASE") {
            ldap.group_search_base = split_list(&bases);
        }
        if let Some(filter) = var("DIRGROUPS_LDAP_GROUP_FILTER") {
            ldap.group_name_list_filter = filter;
        }
        if let Some(attr) = var("DIRGROUPS_LDAP_GROUP_NAME_ATTRIBUTE") {
            ldap.group_name_attribute = attr;
        }
        if let Some(attr) = var("DIRGROUPS_LDAP_MEMBERSHIP_ATTRIBUTE") {
            ldap.membership_attribute = Some(attr);
        }
    }
}

/// Search bases in env vars are `;`-separated since DNs contain commas
fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LDAP server type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LdapServerType {
    /// Generic LDAP server
    #[default]
    Ldap,
    /// Microsoft Active Directory
    ActiveDirectory,
    /// OpenLDAP
    OpenLdap,
    /// 389 Directory Server
    Directory389,
}

impl LdapServerType {
    /// Get default user filter for this server type
    pub fn default_user_filter(&self) -> &'static str {
        match self {
            LdapServerType::ActiveDirectory => "(&(objectClass=user)(sAMAccountName={username}))",
            _ => "(&(objectClass=person)(uid={username}))",
        }
    }

    /// Get default group filter for this server type
    pub fn default_group_filter(&self) -> &'static str {
        match self {
            LdapServerType::ActiveDirectory => "(objectClass=group)",
            LdapServerType::OpenLdap | LdapServerType::Directory389 => "(objectClass=posixGroup)",
            LdapServerType::Ldap => "(objectClass=groupOfNames)",
        }
    }

    /// Get default membership attribute for this server type
    pub fn default_membership_attribute(&self) -> &'static str {
        match self {
            LdapServerType::OpenLdap | LdapServerType::Directory389 => MEMBER_UID,
            _ => "member",
        }
    }
}

/// Directory access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdapConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_ldap_url")]
    pub server_url: String,

    /// Use STARTTLS for connection upgrade
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Bind DN for LDAP queries (service account)
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password
    #[serde(default)]
    pub bind_password: String,

    /// Connection and operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// LDAP server type hint
    #[serde(default)]
    pub server_type: LdapServerType,

    /// Search roots for user entries, searched in order
    #[serde(default)]
    pub user_search_base: Vec<String>,

    /// Attribute holding the login name
    #[serde(default = "default_user_name_attr")]
    pub user_name_attribute: String,

    /// User search filter
    /// Use {username} as placeholder
    #[serde(default = "default_user_filter")]
    pub user_name_search_filter: String,

    /// Search roots for group entries, searched in order
    #[serde(default)]
    pub group_search_base: Vec<String>,

    /// Filter selecting group entries, ANDed with the membership test
    #[serde(default = "default_group_filter")]
    pub group_name_list_filter: String,

    /// Attribute holding the group's name
    #[serde(default = "default_group_name_attr")]
    pub group_name_attribute: String,

    /// Attribute on group entries listing members.
    /// `memberUid` matches by bare uid, anything else by full DN.
    #[serde(default)]
    pub membership_attribute: Option<String>,
}

fn default_ldap_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_name_attr() -> String {
    "uid".to_string()
}

fn default_user_filter() -> String {
    LdapServerType::Ldap.default_user_filter().to_string()
}

fn default_group_filter() -> String {
    LdapServerType::Ldap.default_group_filter().to_string()
}

fn default_group_name_attr() -> String {
    "cn".to_string()
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            server_url: default_ldap_url(),
            start_tls: false,
            skip_tls_verify: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            timeout_seconds: default_timeout(),
            server_type: LdapServerType::default(),
            user_search_base: Vec::new(),
            user_name_attribute: default_user_name_attr(),
            user_name_search_filter: default_user_filter(),
            group_search_base: Vec::new(),
            group_name_list_filter: default_group_filter(),
            group_name_attribute: default_group_name_attr(),
            membership_attribute: None,
        }
    }
}

impl LdapConfig {
    /// Create configuration from server type with sensible defaults
    pub fn from_server_type(server_type: LdapServerType, server_url: &str) -> Self {
        let mut config = Self {
            server_url: server_url.to_string(),
            server_type,
            user_name_search_filter: server_type.default_user_filter().to_string(),
            group_name_list_filter: server_type.default_group_filter().to_string(),
            membership_attribute: Some(server_type.default_membership_attribute().to_string()),
            ..Default::default()
        };

        if server_type == LdapServerType::ActiveDirectory {
            config.user_name_attribute = "sAMAccountName".to_string();
        }

        config
    }

    /// Membership attribute, if configured and non-empty
    pub fn membership_attribute(&self) -> crate::Result<&str> {
        match self.membership_attribute.as_deref() {
            Some(attr) if !attr.is_empty() => Ok(attr),
            _ => Err(crate::Error::MissingMembershipAttribute),
        }
    }

    /// Validate connection and search settings
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: &str| Err(crate::Error::InvalidConfig(msg.to_string()));

        if self.server_url.is_empty() {
            return invalid("Server URL is required");
        }

        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return invalid("Server URL must start with ldap:// or ldaps://");
        }

        if self.bind_dn.is_empty() {
            return invalid("Bind DN is required");
        }

        if self.user_search_base.is_empty() {
            return invalid("At least one user search base is required");
        }

        if !self.user_name_search_filter.contains("{username}") {
            return invalid("User filter must contain {username} placeholder");
        }

        if self.group_search_base.is_empty() {
            return invalid("At least one group search base is required");
        }

        if self.group_name_attribute.is_empty() {
            return invalid("Group name attribute is required");
        }

        Ok(())
    }
}
