//! CLI definitions for askdesk.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tool-calling question desk
#[derive(Parser, Debug)]
#[command(name = "askdesk", version, about = "Tool-calling agent with a one-page web form")]
pub struct Cli {
    /// Config file (defaults to <config dir>/askdesk/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to use (format: provider:model, e.g., groq:qwen-qwq-32b)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web form
    Serve(ServeArgs),
    /// Ask a single question
    Ask(AskArgs),
    /// Interactive session on stdin
    Chat(ChatArgs),
    /// List registered tools
    Tools,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind, overrides `server.bind`
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question
    pub query: String,

    /// Session id (a new one is generated when omitted)
    #[arg(short, long)]
    pub session: Option<String>,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Session id (a new one is generated when omitted)
    #[arg(short, long)]
    pub session: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_with_bind() {
        let cli = Cli::try_parse_from(["askdesk", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000")),
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parse_ask_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "askdesk",
            "ask",
            "what is 7 * 8?",
            "--model",
            "openai:gpt-4o-mini",
            "--config",
            "/tmp/askdesk.toml",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("openai:gpt-4o-mini"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/askdesk.toml")));
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.query, "what is 7 * 8?");
                assert!(args.session.is_none());
            }
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_tools() {
        let cli = Cli::try_parse_from(["askdesk", "tools"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools));
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["askdesk"]).is_err());
    }

    #[test]
    fn parse_ask_missing_query_is_error() {
        assert!(Cli::try_parse_from(["askdesk", "ask"]).is_err());
    }
}
