//! filter command - show the group filter for a DN

use super::CommandContext;
use anyhow::{Context, Result};
use dirgroups_auth::ldap::build_group_filter;
use dirgroups_auth::DistinguishedName;
use serde::Serialize;

#[derive(Serialize)]
struct FilterResult<'a> {
    dn: &'a str,
    filter: String,
    search_bases: &'a [String],
}

pub fn execute(ctx: &CommandContext, dn: &str) -> Result<()> {
    let parsed = DistinguishedName::parse(dn).context("Invalid DN")?;
    let filter = build_group_filter(&ctx.config.ldap, &parsed)?;

    if ctx.is_json() {
        let result = FilterResult {
            dn,
            filter,
            search_bases: &ctx.config.ldap.group_search_base,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", filter);
    }

    Ok(())
}
