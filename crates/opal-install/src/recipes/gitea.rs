//! Gitea: prebuilt binary download, sqlite storage, generated app.ini.

use anyhow::{Result, bail};

use opal_core::secrets;

use crate::cmd::{ExecPolicy, command_exists, run_cmd};
use crate::context::InstallContext;
use crate::files;
use crate::scripts;

use super::finalize;

const GITEA_VERSION: &str = "1.22.3";

const README_NOTES: &str = "Gitea keeps its repositories and sqlite database under ./data. \
The web installer is locked (INSTALL_LOCK); create the first admin user with \
`./gitea admin user create` from the app directory.";

pub async fn run(ctx: &InstallContext) -> Result<()> {
    if !command_exists("curl") {
        bail!("curl not found on PATH");
    }
    std::fs::create_dir_all(ctx.app_dir.join("data"))?;

    let env = ctx.base_env();
    let url = format!(
        "https://dl.gitea.com/gitea/{GITEA_VERSION}/gitea-{GITEA_VERSION}-linux-amd64"
    );
    run_cmd(
        "downloading gitea",
        "curl",
        &["-sL", "-o", "gitea", &url],
        Some(&ctx.app_dir),
        &env,
        ExecPolicy::MustSucceed,
    )?;
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            ctx.app_dir.join("gitea"),
            std::fs::Permissions::from_mode(0o700),
        )?;
    }

    files::write_file(&ctx.app_dir.join("app.ini"), &app_ini(ctx), 0o600)?;

    let start_command = "./gitea web --config app.ini";
    scripts::emit_lifecycle(&ctx.script_params(start_command), README_NOTES)?;

    let notice = format!(
        "Gitea {GITEA_VERSION} installed as {} on port {}.",
        ctx.app.name, ctx.app.port
    );
    finalize(ctx, ExecPolicy::MustSucceed, Some(notice)).await
}

/// Generate app.ini with fresh security tokens. 0600: the tokens are the
/// only secrets this recipe produces.
fn app_ini(ctx: &InstallContext) -> String {
    format!(
        r"; Generated by opal-install
APP_NAME = {name}
RUN_USER = {osuser}
RUN_MODE = prod
WORK_PATH = {dir}

[server]
HTTP_ADDR = 127.0.0.1
HTTP_PORT = {port}
ROOT_URL = http://127.0.0.1:{port}/

[database]
DB_TYPE = sqlite3
PATH = {dir}/data/gitea.db

[security]
INSTALL_LOCK = true
SECRET_KEY = {secret_key}
INTERNAL_TOKEN = {internal_token}

[oauth2]
JWT_SECRET = {jwt_secret}
",
        name = ctx.app.name,
        osuser = ctx.app.osuser_name,
        dir = ctx.app_dir.display(),
        port = ctx.app.port,
        secret_key = secrets::random_hex(64),
        internal_token = secrets::random_token(64),
        jwt_secret = secrets::random_token(43),
    )
}
