//! askdesk binary entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use askdesk::agent::{build_registry, Agent};
use askdesk::cli::{AskArgs, ChatArgs, Cli, Commands, ServeArgs};
use askdesk::config::AgentConfig;
use askdesk::error::{AgentError, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "askdesk=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
        config.validate()?;
    }

    match cli.command {
        Commands::Serve(args) => handle_serve(config, args).await,
        Commands::Ask(args) => handle_ask(&config, args).await,
        Commands::Chat(args) => handle_chat(&config, args).await,
        Commands::Tools => handle_tools(&config),
    }
}

async fn handle_serve(mut config: AgentConfig, args: ServeArgs) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    let addr: SocketAddr = config.server.bind.parse().map_err(|_| {
        AgentError::Configuration(format!("invalid bind address '{}'", config.server.bind))
    })?;
    let agent = Arc::new(Agent::from_config(&config)?);
    askdesk::server::serve(agent, addr).await
}

async fn handle_ask(config: &AgentConfig, args: AskArgs) -> Result<()> {
    let agent = Agent::from_config(config)?;
    let session_id = args.session.unwrap_or_else(|| Uuid::new_v4().to_string());
    let interaction = agent.respond(&session_id, &args.query).await?;
    println!("{}", interaction.answer);
    Ok(())
}

async fn handle_chat(config: &AgentConfig, args: ChatArgs) -> Result<()> {
    let agent = Agent::from_config(config)?;
    let session_id = args.session.unwrap_or_else(|| Uuid::new_v4().to_string());
    eprintln!("session {session_id} (type 'exit' to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }
        let interaction = agent.respond(&session_id, query).await?;
        stdout
            .write_all(format!("{}\n", interaction.answer).as_bytes())
            .await?;
    }
    Ok(())
}

fn handle_tools(config: &AgentConfig) -> Result<()> {
    let registry = build_registry(config)?;
    for definition in registry.definitions() {
        println!("{:<12} {}", definition.name, definition.description);
    }
    Ok(())
}
