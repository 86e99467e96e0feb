/// Expose the importer, analyzer and prompt formatter to MCP clients.
#[derive(Debug, clap::Parser)]
#[command(name = "mcp")]
#[command(about = "Serve codeprompt tools over the Model Context Protocol")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Read newline-delimited JSON-RPC requests from stdin, answer on stdout
    Stdio,

    /// Listen on HTTP: `GET /sse` announces the endpoint, `POST /message` answers
    Sse(SseOptions),
}

#[derive(Debug, clap::Args)]
pub struct SseOptions {
    /// Port for the HTTP listener
    #[arg(short, long, env = "CODEPROMPT_MCP_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Interface to bind; use 0.0.0.0 to accept remote clients
    #[arg(long, env = "CODEPROMPT_MCP_HOST", default_value = "127.0.0.1")]
    pub host: String,
}
