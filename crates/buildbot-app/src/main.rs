//! Binary entry point for the buildbot GitHub bridge: wires the GitHub API
//! client and the buildbot try scheduler into the webhook server.

mod bootstrap_helpers;
mod cli_args;
mod server;

use std::sync::Arc;

use anyhow::Result;
use buildbot_github::api_client::GithubApiClient;
use buildbot_runtime::trybot::BuildbotTryScheduler;
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::AppConfig;
use crate::server::{run_app_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = AppConfig::parse();

    let github = GithubApiClient::new(
        config.github_api_base.clone(),
        config.github_token.clone(),
        config.github_request_timeout_ms,
    )?;
    let scheduler = BuildbotTryScheduler::new(
        config.buildbot_master.clone(),
        config.buildbot_try_user.clone(),
        config.buildbot_try_password.clone(),
    );
    let state = Arc::new(AppState {
        ops: Arc::new(github),
        scheduler: Arc::new(scheduler),
        webhook_secret: config.github_webhook_secret.clone(),
    });

    run_app_server(&config.bind_address, state).await
}
