use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use configcat_mcp_runtime::{DEFAULT_BASE_URL, McpCommands, ServeArgs, run as run_mcp};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "configcat-mcp",
    version,
    about = "ConfigCat MCP server: the ConfigCat Public Management API as MCP tools over stdio"
)]
struct Cli {
    /// Public Management API base URL
    #[arg(long, env = "CONFIGCAT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Public API credential username
    #[arg(long, env = "CONFIGCAT_API_USER", default_value = "", hide_env_values = true)]
    api_user: String,

    /// Public API credential password
    #[arg(long, env = "CONFIGCAT_API_PASS", default_value = "", hide_env_values = true)]
    api_pass: String,

    /// Log line format on stderr
    #[arg(long, value_enum, env = "CONFIGCAT_MCP_LOG_FORMAT", default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<McpCommands>,
}

fn init_tracing(format: LogFormat) {
    // stdout carries the protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "configcat_mcp=info,configcat_mcp_runtime=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let command = cli.command.unwrap_or(McpCommands::Serve(cli.serve));
    let code = run_mcp(&cli.base_url, &cli.api_user, &cli.api_pass, command).await;
    std::process::exit(code);
}
