//! Bare port application: no database, no runtime install.
//!
//! The slot owner brings their own executable; the recipe only prepares the
//! directory, lifecycle scripts, keepalive, and completion report.

use anyhow::Result;

use crate::cmd::ExecPolicy;
use crate::context::InstallContext;
use crate::scripts;

use super::finalize;

const README_NOTES: &str = "Place your service executable at ./run (it must bind the assigned \
port on 127.0.0.1), then launch it with ./start.";

pub async fn run(ctx: &InstallContext) -> Result<()> {
    std::fs::create_dir_all(&ctx.app_dir)?;

    let params = ctx.script_params("./run");
    scripts::emit_lifecycle(&params, README_NOTES)?;

    let notice = format!(
        "Application {} is ready. Bind your service to 127.0.0.1:{} and manage it with the \
         start/stop scripts in {}.",
        ctx.app.name,
        ctx.app.port,
        ctx.app_dir.display()
    );

    // ./run does not exist until the owner supplies it, so the initial start
    // is best-effort by design.
    finalize(ctx, ExecPolicy::BestEffort, Some(notice)).await
}
