//! Translate gateway 主程序入口

use clap::Parser;
use tracing_subscriber::EnvFilter;

use translate_gateway::env::{self, EnvConfig, EnvVar};
use translate_gateway::token::{now_unix, Token};
use translate_gateway::web::{AppState, WebConfig, WebServer};

#[derive(Parser)]
#[command(
    name = "translate-gateway",
    about = "Caching, token-guarded gateway in front of a batch translation API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Bind address [env: BIND_ADDRESS, default: 0.0.0.0]
        #[arg(long, short = 'b', value_name = "ADDRESS")]
        bind: Option<String>,

        /// Port number [env: PORT, default: 3000]
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Print a token signed with SERVER_SECRET
    IssueToken {
        /// Seconds until the token expires
        #[arg(long, default_value_t = 3600)]
        ttl: u64,
    },

    /// Print the environment variable reference
    EnvDocs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 文件可选
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { bind: None, port: None }) {
        Command::Serve { bind, port } => serve(bind, port).await,
        Command::IssueToken { ttl } => issue_token(ttl),
        Command::EnvDocs => {
            print!("{}", env::generate_env_docs());
            Ok(())
        }
    }
}

async fn serve(bind: Option<String>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let env_config = EnvConfig::from_env()?;
    env_config.log_summary();
    env_config.warn_missing();

    let web_config = WebConfig::from_env_config(&env_config).with_overrides(bind, port);
    web_config.validate()?;

    let state = AppState::from_env_config(&env_config).await?;
    WebServer::new(web_config, state).start().await?;
    Ok(())
}

fn issue_token(ttl: u64) -> Result<(), Box<dyn std::error::Error>> {
    let secret = env::security::ServerSecret::get()?;
    let expiry = now_unix().saturating_add(ttl);
    println!("{}", Token::issue(&secret, expiry));
    Ok(())
}

fn init_tracing() {
    let level = env::core::LogLevel::get_or_default("info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
