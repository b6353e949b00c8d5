//! twiml-reminder: webhook serving medication reminder voice documents.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use twiml_reminder::{api, config, init_logging};

#[derive(Parser, Debug)]
#[command(name = "twiml-reminder", about = "Medication reminder TwiML webhook")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Escape XML-special characters in caller values
    #[arg(long)]
    escape_input: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("twiml-reminder starting");

    let mut server = config::Config::load(args.config.as_deref())?.server;
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }
    server.escape_input |= args.escape_input;
    info!("Server config: {:?}", server);

    let state = api::ApiState::new(server.escape_input);
    api::serve(state, &server.host, server.port).await?;

    Ok(())
}
