use clap::{Parser, Subcommand};
use starter_mcp::Result;
use starter_mcp::commands::{call_tool, list_tools, serve_mcp};
use starter_mcp::config::{Config, get_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "starter-mcp")]
#[command(about = "A small MCP server exposing greeting, arithmetic and directory listing tools")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.starter-mcp)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio (the default)
    Serve,
    /// List the tools the server exposes
    Tools {
        /// Print the MCP tool definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Invoke a tool once and print its result
    Call {
        /// Name of the tool to invoke
        tool: String,
        /// Tool arguments as a JSON object, e.g. '{"a": 1, "b": 2}'
        #[arg(long)]
        args: Option<String>,
    },
    /// Configure the server name, instructions and log filter
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };
    let config = Config::load(&config_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter()?)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            serve_mcp(&config).await?;
        }
        Commands::Tools { json } => {
            list_tools(json)?;
        }
        Commands::Call { tool, args } => {
            call_tool(&tool, args.as_deref()).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
    }

    Ok(())
}
