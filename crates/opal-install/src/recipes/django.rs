//! Django application: PostgreSQL database, virtualenv, gunicorn.

use std::path::PathBuf;

use anyhow::{Result, bail};

use opal_api::DbKind;
use opal_core::secrets;

use crate::cmd::{ExecPolicy, command_exists, run_cmd};
use crate::context::{DEFAULT_PATH, InstallContext};
use crate::db::{self, DbCredentials};
use crate::files;
use crate::scripts;

use super::finalize;

const PIP_PACKAGES: &[&str] = &["django", "gunicorn", "psycopg2-binary"];

const README_NOTES: &str = "The Django project lives in ./project with settings driven by the \
.env file. Activate the virtualenv with `source env/bin/activate` before running manage.py \
commands.";

pub async fn run(ctx: &InstallContext) -> Result<()> {
    if !command_exists("python3") {
        bail!("python3 not found on PATH");
    }
    std::fs::create_dir_all(&ctx.app_dir)?;

    let creds = db::provision(&ctx.api, &ctx.app, DbKind::Psql, &ctx.poll).await?;

    let env = ctx.base_env();
    run_cmd(
        "creating virtualenv",
        "python3",
        &["-m", "venv", "env"],
        Some(&ctx.app_dir),
        &env,
        ExecPolicy::MustSucceed,
    )?;

    // Later commands resolve pip/django-admin through the virtualenv.
    let venv_env = ctx.base_env().with(
        "PATH",
        format!("{}/env/bin:{DEFAULT_PATH}", ctx.app_dir.display()),
    );

    let mut pip_args = vec!["install", "--quiet"];
    pip_args.extend_from_slice(PIP_PACKAGES);
    run_cmd(
        "installing python packages",
        "pip",
        &pip_args,
        Some(&ctx.app_dir),
        &venv_env,
        ExecPolicy::MustSucceed,
    )?;

    run_cmd(
        "creating django project",
        "django-admin",
        &["startproject", "project", "."],
        Some(&ctx.app_dir),
        &venv_env,
        ExecPolicy::MustSucceed,
    )?;

    write_env_file(ctx, &creds)?;

    run_cmd(
        "running initial migrations",
        "python",
        &["manage.py", "migrate", "--noinput"],
        Some(&ctx.app_dir),
        &venv_env,
        ExecPolicy::MustSucceed,
    )?;

    let start_command = format!(
        "./env/bin/gunicorn --workers 2 --bind 127.0.0.1:{} project.wsgi",
        ctx.app.port
    );
    scripts::emit_lifecycle(&ctx.script_params(&start_command), README_NOTES)?;

    let notice = format!(
        "Django application {name} installed. PostgreSQL database: {db} (user {user}); the \
         password is in {dir}/.env.",
        name = ctx.app.name,
        db = creds.db_name,
        user = creds.user,
        dir = ctx.app_dir.display(),
    );
    finalize(ctx, ExecPolicy::MustSucceed, Some(notice)).await
}

/// Write the `.env` consumed by the generated settings module.
///
/// The database password must land here byte-for-byte identical to the one
/// sent in the create payload.
pub fn write_env_file(ctx: &InstallContext, creds: &DbCredentials) -> Result<PathBuf> {
    let path = ctx.app_dir.join(".env");
    let content = format!(
        "# Generated by opal-install; consumed by project/settings.py\n\
         SECRET_KEY={secret}\n\
         DEBUG=False\n\
         ALLOWED_HOSTS=*\n\
         PORT={port}\n\
         DB_ENGINE=django.db.backends.postgresql\n\
         DB_NAME={db}\n\
         DB_USER={user}\n\
         DB_PASSWORD={password}\n\
         DB_HOST=localhost\n\
         DB_PORT=5432\n",
        secret = secrets::random_hex(50),
        port = ctx.app.port,
        db = creds.db_name,
        user = creds.user,
        password = creds.password,
    );
    files::write_file(&path, &content, 0o600)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use opal_api::ApiClient;

    use super::*;

    fn test_ctx(base: &Path) -> InstallContext {
        let api = ApiClient::new("https://my.opalstack.com", "tok").unwrap();
        let app = serde_json::from_value(serde_json::json!({
            "id": "3f6a",
            "name": "testapp",
            "port": 12345,
            "osuser_name": "testuser",
            "server": "srv-1",
        }))
        .unwrap();
        InstallContext::with_base(api, app, base)
    }

    #[test]
    fn env_file_embeds_password_verbatim_with_0600() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let creds = DbCredentials {
            db_name: "testapp".into(),
            user: "testapp".into(),
            password: "p4ssw0rdp4ssw0rd1234".into(),
        };

        let path = write_env_file(&ctx, &creds).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("DB_PASSWORD=p4ssw0rdp4ssw0rd1234\n"));
        assert!(content.contains("PORT=12345\n"));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn env_file_secret_key_differs_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let creds = DbCredentials {
            db_name: "d".into(),
            user: "u".into(),
            password: "p".into(),
        };
        let path = write_env_file(&ctx, &creds).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        let path = write_env_file(&ctx, &creds).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_ne!(first, second, "SECRET_KEY should be regenerated");
    }
}
