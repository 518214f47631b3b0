//! Per-application provisioning recipes.
//!
//! Each recipe is one linear flow with the common shape: resolve metadata,
//! provision a database if the application needs one, install the software,
//! generate config, emit lifecycle scripts, then [`finalize`]. Failure
//! policy is declared per command at the call site; prerequisite steps are
//! always `MustSucceed`.

pub mod custom;
pub mod django;
pub mod ghost;
pub mod gitea;

use anyhow::Result;

use crate::cmd::{ExecPolicy, run_cmd};
use crate::context::InstallContext;
use crate::cron;

/// Common tail of every recipe: cron keepalive, one synchronous start,
/// report installed, optional dashboard notice.
pub(crate) async fn finalize(
    ctx: &InstallContext,
    start_policy: ExecPolicy,
    notice: Option<String>,
) -> Result<()> {
    let start = ctx.app_dir.join("start");
    if ctx.skip_cron {
        tracing::info!("skipping cron keepalive");
    } else {
        cron::install_keepalive(&start)?;
    }

    let start_path = start.to_string_lossy();
    run_cmd(
        &format!("starting {}", ctx.app.name),
        &start_path,
        &[],
        Some(&ctx.app_dir),
        &ctx.base_env(),
        start_policy,
    )?;

    ctx.api.app_installed(&ctx.app.id).await?;
    tracing::info!("reported {} as installed", ctx.app.name);

    if let Some(content) = notice {
        ctx.api.notice_create(&content).await?;
    }
    Ok(())
}
