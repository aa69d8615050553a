use clap::Parser;

/// Configuration for the buildbot GitHub bridge, sourced from flags or the
/// environment the original deployment already exports.
#[derive(Debug, Clone, Parser)]
#[command(name = "buildbot-app", about = "GitHub pull-request to buildbot bridge")]
pub struct AppConfig {
    /// Token used for GitHub REST calls.
    #[arg(long, env = "APP_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Base URL of the GitHub REST API.
    #[arg(long, env = "APP_GITHUB_API_BASE", default_value = "https://api.github.com")]
    pub github_api_base: String,

    /// Shared secret for webhook signature verification. When empty,
    /// signatures are not checked (local development only).
    #[arg(long, env = "APP_GITHUB_WEBHOOK_SECRET", default_value = "", hide_env_values = true)]
    pub github_webhook_secret: String,

    /// Address the HTTP server binds to.
    #[arg(long, env = "APP_SERVER_BIND_ADDRESS", default_value = "127.0.0.1:8080")]
    pub bind_address: String,

    /// GitHub request timeout in milliseconds.
    #[arg(long, env = "APP_GITHUB_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    pub github_request_timeout_ms: u64,

    /// Buildbot master `host:port` for `buildbot try`.
    #[arg(long, env = "BUILDBOT_MASTER")]
    pub buildbot_master: String,

    /// Try-scheduler username.
    #[arg(long, env = "BUILDBOT_TRY_USER")]
    pub buildbot_try_user: String,

    /// Try-scheduler password.
    #[arg(long, env = "BUILDBOT_TRY_PASSWORD", hide_env_values = true)]
    pub buildbot_try_password: String,
}
