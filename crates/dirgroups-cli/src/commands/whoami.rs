//! whoami command - show the DN a username resolves to

use super::{release, CommandContext};
use anyhow::Result;
use colored::Colorize;
use dirgroups_auth::{NameResolver, SearchNameResolver};
use serde::Serialize;

#[derive(Serialize)]
struct WhoamiResult {
    username: String,
    dn: Option<String>,
}

pub async fn execute(ctx: &CommandContext, username: &str) -> Result<()> {
    let mut session = ctx.connect().await?;
    let resolved = SearchNameResolver
        .resolve(username, &ctx.config.ldap, &mut session)
        .await;
    release(session).await;

    let dn = resolved?.map(|dn| dn.to_string());

    if ctx.is_json() {
        let result = WhoamiResult {
            username: username.to_string(),
            dn,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match dn {
            Some(dn) => println!("{}", dn),
            None => eprintln!("{}", format!("User '{}' not found", username).yellow()),
        }
    }

    Ok(())
}
