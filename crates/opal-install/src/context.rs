//! Per-run install context threaded through the recipes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use opal_api::{ApiClient, AppRecord};

use crate::cmd::CmdEnv;
use crate::db::PollConfig;
use crate::scripts::ScriptParams;

/// PATH handed to subprocesses. Nothing ambient is inherited; recipes
/// extend this explicitly (e.g. with a virtualenv bin directory).
pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Everything a recipe needs: the API handle, the application record, and
/// where on disk the application lives.
#[derive(Debug, Clone)]
pub struct InstallContext {
    pub api: ApiClient,
    pub app: AppRecord,
    /// Base directory holding `apps/<name>`; normally the OS user's home.
    pub base_dir: PathBuf,
    pub app_dir: PathBuf,
    pub poll: PollConfig,
    /// Skip the crontab mutation (`--skip-cron`, and tests).
    pub skip_cron: bool,
}

impl InstallContext {
    /// Context rooted at the invoking user's home directory.
    pub fn new(api: ApiClient, app: AppRecord) -> Result<Self> {
        let home = dirs::home_dir().context("cannot determine home directory")?;
        Ok(Self::with_base(api, app, &home))
    }

    /// Context rooted at an explicit base directory.
    pub fn with_base(api: ApiClient, app: AppRecord, base: &Path) -> Self {
        let app_dir = base.join("apps").join(&app.name);
        Self {
            api,
            app,
            base_dir: base.to_path_buf(),
            app_dir,
            poll: PollConfig::default(),
            skip_cron: false,
        }
    }

    /// The baseline subprocess environment for this run.
    pub fn base_env(&self) -> CmdEnv {
        CmdEnv::new()
            .with("PATH", DEFAULT_PATH)
            .with("HOME", self.base_dir.to_string_lossy())
    }

    /// Script template parameters for a given launch command.
    pub fn script_params<'a>(&'a self, start_command: &'a str) -> ScriptParams<'a> {
        ScriptParams {
            app_name: &self.app.name,
            app_dir: &self.app_dir,
            port: self.app.port,
            start_command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> AppRecord {
        serde_json::from_value(serde_json::json!({
            "id": "3f6a",
            "name": "testapp",
            "port": 12345,
            "osuser_name": "testuser",
            "server": "srv-1",
        }))
        .unwrap()
    }

    #[test]
    fn app_dir_is_under_apps() {
        let api = ApiClient::new("https://my.opalstack.com", "tok").unwrap();
        let ctx = InstallContext::with_base(api, test_app(), Path::new("/home/testuser"));
        assert_eq!(
            ctx.app_dir,
            PathBuf::from("/home/testuser/apps/testapp")
        );
    }

    #[test]
    fn base_env_has_path_and_home_only() {
        let api = ApiClient::new("https://my.opalstack.com", "tok").unwrap();
        let ctx = InstallContext::with_base(api, test_app(), Path::new("/home/testuser"));
        let vars: Vec<_> = ctx.base_env().vars().map(|(k, _)| k.to_string()).collect();
        assert_eq!(vars, ["PATH", "HOME"]);
    }
}
