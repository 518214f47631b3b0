//! Opal application installer.
//!
//! Provisions one third-party application onto a pre-allocated hosting
//! slot: reads the application record from the control plane, runs the
//! selected recipe, and reports completion.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use opal_api::ApiClient;
use opal_install::context::InstallContext;
use opal_install::recipes;

#[derive(Debug, Parser)]
#[command(name = "opal-install")]
#[command(version, about = "Provision applications onto Opal hosting slots")]
struct Cli {
    /// Application UUID of the pre-allocated slot
    #[arg(short = 'i', long = "uuid", env = "UUID")]
    uuid: String,

    /// Application name (informational; the control-plane record wins)
    #[arg(short = 'n', long = "name", env = "APPNAME")]
    name: Option<String>,

    /// Control-plane API token
    #[arg(short = 't', long = "token", env = "OPAL_TOKEN")]
    token: Option<String>,

    /// Control-plane username, used for the login fallback when no token is given
    #[arg(short = 'u', long = "api-user", env = "OPAL_USER")]
    api_user: Option<String>,

    /// Control-plane password for the login fallback
    #[arg(short = 'p', long = "api-password", env = "OPAL_PASS")]
    api_password: Option<String>,

    /// Control-plane host
    #[arg(long, env = "API_URL", default_value = "https://my.opalstack.com")]
    host: String,

    /// Do not register the cron keepalive
    #[arg(long)]
    skip_cron: bool,

    #[command(subcommand)]
    recipe: Recipe,
}

#[derive(Debug, Subcommand)]
enum Recipe {
    /// Bare port application (bring your own executable)
    Custom,
    /// Django with PostgreSQL and gunicorn
    Django,
    /// Ghost with MariaDB
    Ghost,
    /// Gitea from a prebuilt binary
    Gitea,
}

#[tokio::main]
async fn main() -> Result<()> {
    opal_core::tracing_init::init_tracing("opal_install=info,opal_api=info");

    let cli = Cli::parse();

    let api = match &cli.token {
        Some(token) => ApiClient::new(&cli.host, token)?,
        None => {
            let user = cli
                .api_user
                .as_deref()
                .context("no API token and no username given")?;
            let pass = cli
                .api_password
                .as_deref()
                .context("no API token and no password given")?;
            ApiClient::login(&cli.host, user, pass).await?
        }
    };

    let app = api.app_read(&cli.uuid).await?;
    if let Some(name) = &cli.name
        && *name != app.name
    {
        tracing::warn!(
            "-n {name} does not match the control-plane record name {}; using the record",
            app.name
        );
    }
    tracing::info!(
        "installing {} (port {}, user {})",
        app.name,
        app.port,
        app.osuser_name
    );

    let mut ctx = InstallContext::new(api, app)?;
    ctx.skip_cron = cli.skip_cron;

    match cli.recipe {
        Recipe::Custom => recipes::custom::run(&ctx).await?,
        Recipe::Django => recipes::django::run(&ctx).await?,
        Recipe::Ghost => recipes::ghost::run(&ctx).await?,
        Recipe::Gitea => recipes::gitea::run(&ctx).await?,
    }

    tracing::info!("install complete: {}", ctx.app.name);
    Ok(())
}
