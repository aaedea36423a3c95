//! minidfs binary: coordinator, chunkserver and client in one executable

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use minidfs::common::{ChunkserverConfig, ClientConfig, Config, CoordinatorConfig};
use minidfs::{ChunkserverServer, Client, Coordinator};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minidfs")]
#[command(about = "minimal distributed chunked file store", version)]
struct Cli {
    /// TOML config file (defaults to ./minidfs.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the master server
    Master {
        /// Port to run the server on
        #[arg(long)]
        port: Option<u16>,

        /// Chunk size in bytes
        #[arg(long = "chunkSize")]
        chunk_size: Option<u64>,
    },

    /// Start an instance of the chunkserver
    Chunkserver {
        /// Port to run the server on
        #[arg(long)]
        port: Option<u16>,

        /// Master server url
        #[arg(long)]
        master: Option<String>,

        /// Directory to store the chunks in
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Interact with the file store
    Client {
        /// Master server url
        #[arg(long)]
        master: Option<String>,

        /// Action to perform
        #[arg(long, value_enum, ignore_case = true)]
        action: Option<Action>,

        /// Input file name
        #[arg(long)]
        filename: Option<String>,

        /// Output file name (read only)
        #[arg(long = "output-filename")]
        output_filename: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Action {
    Read,
    Write,
}

fn any_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}

fn coordinator_config(
    file: Option<CoordinatorConfig>,
    port: Option<u16>,
    chunk_size: Option<u64>,
) -> anyhow::Result<CoordinatorConfig> {
    let from_file = file.is_some();
    let mut config = file.unwrap_or_default();
    match port {
        Some(port) => config.bind_addr = any_addr(port),
        None if !from_file => bail!("please specify a port using '--port 8000'"),
        None => {}
    }
    match chunk_size {
        Some(chunk_size) => config.chunk_size = chunk_size,
        None if !from_file => bail!("please specify a chunk size using '--chunkSize 1024'"),
        None => {}
    }
    Ok(config)
}

fn chunkserver_config(
    file: Option<ChunkserverConfig>,
    port: Option<u16>,
    master: Option<String>,
    dir: Option<PathBuf>,
) -> anyhow::Result<ChunkserverConfig> {
    let from_file = file.is_some();
    let mut config = file.unwrap_or_default();
    match port {
        Some(port) => config.bind_addr = any_addr(port),
        None if !from_file => bail!("please specify a port using '--port 8001'"),
        None => {}
    }
    match master.filter(|m| !m.trim().is_empty()) {
        Some(master) => config.coordinator_url = master,
        None if !from_file => {
            bail!("please specify the master url using '--master http://localhost:8000'")
        }
        None => {}
    }
    match dir {
        Some(dir) => config.data_dir = dir,
        None if !from_file => bail!("please specify a valid directory using '--dir ./data'"),
        None => {}
    }
    Ok(config)
}

fn client_config(file: Option<ClientConfig>, master: Option<String>) -> anyhow::Result<ClientConfig> {
    let from_file = file.is_some();
    let mut config = file.unwrap_or_default();
    match master.filter(|m| !m.trim().is_empty()) {
        Some(master) => config.coordinator_url = master,
        None if !from_file => {
            bail!("please specify the master url using '--master http://localhost:8000'")
        }
        None => {}
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Master { port, chunk_size } => {
            let coord_config = coordinator_config(config.coordinator, port, chunk_size)?;
            Coordinator::new(coord_config)?.serve().await?;
        }
        Commands::Chunkserver { port, master, dir } => {
            let cs_config = chunkserver_config(config.chunkserver, port, master, dir)?;
            ChunkserverServer::new(cs_config)?.serve().await?;
        }
        Commands::Client {
            master,
            action,
            filename,
            output_filename,
        } => {
            let client_config = client_config(config.client, master)?;
            let Some(action) = action else {
                bail!("action needs to specified as read or write using '--action read'");
            };
            let Some(filename) = filename.filter(|f| !f.is_empty()) else {
                bail!("please specify a filename using '--filename input.txt'");
            };
            let client = Client::new(client_config)?;

            match action {
                Action::Write => {
                    let report = client.write(&filename, &filename).await?;
                    println!("{}", report);
                    println!("File id: {}", report.file_id);
                }
                Action::Read => {
                    let Some(output) = output_filename else {
                        bail!("please specify a output filename using '--output-filename output.txt' for the read action");
                    };
                    let report = client.read(&filename, &output).await?;
                    println!("{} -> {}", report, output.display());
                }
            }
        }
    }

    Ok(())
}
