//! CLI command implementations

pub mod filter;
pub mod groups;
pub mod whoami;

use crate::OutputFormat;
use anyhow::{Context, Result};
use dirgroups_auth::LdapSession;
use dirgroups_core::DirgroupsConfig;
use tracing::{debug, warn};

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirgroupsConfig,
    pub output_format: OutputFormat,
    pub service_id: String,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Validate the LDAP settings and open a bound session
    pub async fn connect(&self) -> Result<LdapSession> {
        self.config
            .ldap
            .validate()
            .context("Invalid LDAP configuration")?;

        debug!("Opening LDAP session for service '{}'", self.service_id);
        LdapSession::connect(&self.config.ldap)
            .await
            .context("Could not open LDAP session")
    }
}

/// Unbind once a command is done with its session. The command's own
/// outcome matters more, so a failed unbind is only logged.
pub async fn release(session: LdapSession) -> bool {
    log_unbind(session.unbind().await)
}

fn log_unbind(result: dirgroups_core::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to unbind LDAP session: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirgroups_core::Error;

    #[test]
    fn test_unbind_failure_is_not_fatal() {
        assert!(log_unbind(Ok(())));
        assert!(!log_unbind(Err(Error::Directory(
            "Unbind failed: connection closed".to_string()
        ))));
    }
}
