//! askdesk: a tool-calling question desk.
//!
//! A language model is wired to a small registry of tools (integer
//! arithmetic, Wikipedia, arXiv, web search) and driven by a bounded
//! dispatch loop. Each session keeps its conversation in memory, and the
//! agent is exposed through a one-page web form and a CLI.
//!
//! # Quick Start
//!
//! ```no_run
//! use askdesk::prelude::*;
//!
//! # async fn example() -> askdesk::error::Result<()> {
//! let config = AgentConfig::load(None)?;
//! let agent = Agent::from_config(&config)?;
//! let interaction = agent.respond("session-1", "what is 7 * 8?").await?;
//! println!("{}", interaction.answer);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub mod server;
