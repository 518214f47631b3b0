//! Ghost application: download-and-extract install, MariaDB database,
//! configuration through environment variables.

use anyhow::{Result, bail};

use opal_api::DbKind;

use crate::cmd::{ExecPolicy, command_exists, run_cmd};
use crate::context::InstallContext;
use crate::db;
use crate::files;
use crate::scripts;

use super::finalize;

const GHOST_VERSION: &str = "5.87.1";

const README_NOTES: &str = "Ghost is configured entirely through the .env file; edit `url` \
there once your domain is routed, then ./restart. First-run admin setup happens at \
/ghost/ in the browser.";

/// Launch command: the start script exports the env file, then runs Ghost.
const START_COMMAND: &str = "env $(grep -v '^#' .env | xargs) node ghost/index.js";

pub async fn run(ctx: &InstallContext) -> Result<()> {
    for bin in ["curl", "unzip", "node", "npm"] {
        if !command_exists(bin) {
            bail!("{bin} not found on PATH");
        }
    }
    std::fs::create_dir_all(&ctx.app_dir)?;

    let env = ctx.base_env();
    let url = format!(
        "https://github.com/TryGhost/Ghost/releases/download/v{GHOST_VERSION}/Ghost-{GHOST_VERSION}.zip"
    );
    run_cmd(
        "downloading ghost",
        "curl",
        &["-sL", "-o", "ghost.zip", &url],
        Some(&ctx.app_dir),
        &env,
        ExecPolicy::MustSucceed,
    )?;
    run_cmd(
        "extracting ghost",
        "unzip",
        &["-oq", "ghost.zip", "-d", "ghost"],
        Some(&ctx.app_dir),
        &env,
        ExecPolicy::MustSucceed,
    )?;
    run_cmd(
        "installing node dependencies",
        "npm",
        &["install", "--omit=dev"],
        Some(&ctx.app_dir.join("ghost")),
        &env,
        ExecPolicy::MustSucceed,
    )?;
    // Leftover archive is cosmetic.
    run_cmd(
        "removing ghost archive",
        "rm",
        &["-f", "ghost.zip"],
        Some(&ctx.app_dir),
        &env,
        ExecPolicy::BestEffort,
    )?;

    // The env file is written before the database exists, then patched with
    // the real credentials once provisioning completes.
    let env_path = ctx.app_dir.join(".env");
    files::write_file(&env_path, &base_env_file(ctx), 0o600)?;

    let creds = db::provision(&ctx.api, &ctx.app, DbKind::Maria, &ctx.poll).await?;
    files::patch_env_file(&env_path, &[
        ("database__connection__user", creds.user.as_str()),
        ("database__connection__password", creds.password.as_str()),
        ("database__connection__database", creds.db_name.as_str()),
    ])?;

    scripts::emit_lifecycle(&ctx.script_params(START_COMMAND), README_NOTES)?;

    let notice = format!(
        "Ghost {GHOST_VERSION} installed as {name} on port {port}. MariaDB database: {db} \
         (user {user}); the password is in {dir}/.env.",
        name = ctx.app.name,
        port = ctx.app.port,
        db = creds.db_name,
        user = creds.user,
        dir = ctx.app_dir.display(),
    );
    finalize(ctx, ExecPolicy::MustSucceed, Some(notice)).await
}

/// Initial env file with placeholder database credentials.
fn base_env_file(ctx: &InstallContext) -> String {
    format!(
        "# Generated by opal-install; exported by ./start\n\
         NODE_ENV=production\n\
         url=http://127.0.0.1:{port}\n\
         server__host=127.0.0.1\n\
         server__port={port}\n\
         database__client=mysql\n\
         database__connection__host=localhost\n\
         database__connection__user=pending\n\
         database__connection__password=pending\n\
         database__connection__database=pending\n",
        port = ctx.app.port,
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use opal_api::ApiClient;

    use super::*;

    fn test_ctx() -> InstallContext {
        let api = ApiClient::new("https://my.opalstack.com", "tok").unwrap();
        let app = serde_json::from_value(serde_json::json!({
            "id": "3f6a",
            "name": "testapp",
            "port": 12345,
            "osuser_name": "testuser",
            "server": "srv-1",
        }))
        .unwrap();
        InstallContext::with_base(api, app, Path::new("/home/testuser"))
    }

    #[test]
    fn base_env_binds_assigned_port() {
        let content = base_env_file(&test_ctx());
        assert!(content.contains("server__port=12345\n"));
        assert!(content.contains("database__client=mysql\n"));
    }

    #[test]
    fn base_env_credentials_are_placeholders() {
        let content = base_env_file(&test_ctx());
        assert!(content.contains("database__connection__password=pending\n"));
    }
}
