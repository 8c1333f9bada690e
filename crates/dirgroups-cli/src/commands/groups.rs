//! groups command - list the groups of a user

use super::{release, CommandContext};
use anyhow::Result;
use colored::Colorize;
use dirgroups_auth::{get_groups, LdapConnection};
use serde::Serialize;

/// Outward shape of a lookup. No groups is reported as `null`, whether the
/// user is unknown or simply in no group.
#[derive(Debug, Serialize)]
pub struct GroupsResult {
    pub username: String,
    pub groups: Option<Vec<String>>,
}

impl GroupsResult {
    pub fn new(username: &str, groups: Vec<String>) -> Self {
        Self {
            username: username.to_string(),
            groups: if groups.is_empty() { None } else { Some(groups) },
        }
    }
}

pub async fn execute(ctx: &CommandContext, username: &str) -> Result<()> {
    let mut session = ctx.connect().await?;

    let lookup = {
        let mut conn = LdapConnection::new(&mut session, &ctx.config.ldap, &ctx.service_id);
        get_groups(&mut conn, username).await
    };
    release(session).await;

    let result = GroupsResult::new(username, lookup?);

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match &result.groups {
        Some(groups) => {
            for group in groups {
                println!("{}", group);
            }
        }
        None => eprintln!("{}", format!("No groups found for '{}'", username).yellow()),
    }

    Ok(())
}
