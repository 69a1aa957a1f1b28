use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formats::{GridSnapshot, decode, encode};
use serde::Serialize;
use streaming::{ClientConfig, GridClient};
use scene::{GridContext, GridRecord};
use tools::{CellReport, SnapshotSummary, WORLD_BBOX, deleted_hits, parse_rule};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect, encode and fetch grid snapshots")]
struct Args {
    /// Grid service base URL (default: GRID_API_URL or http://127.0.0.1:8000)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print JSON instead of a text summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a payload file
    Inspect {
        path: PathBuf,
    },

    /// Write a payload file from comma-separated levels and ids
    Encode {
        #[arg(long, value_delimiter = ',')]
        levels: Vec<u8>,

        #[arg(long, value_delimiter = ',')]
        ids: Vec<u32>,

        #[arg(long)]
        out: PathBuf,
    },

    /// Fetch a snapshot by URL (GET, or POST with a JSON body)
    Fetch {
        url: String,

        /// JSON request body; switches to POST
        #[arg(long)]
        post: Option<String>,
    },

    /// Show a cell's parent, children and local id under the given rules
    Cell {
        /// Subdivision rules per level, e.g. `2x2,4x4,2x2`
        #[arg(long, value_delimiter = ',', value_parser = parse_rule, required = true)]
        rules: Vec<[u32; 2]>,

        level: u8,

        global_id: u32,
    },

    /// Query the topology service
    Topo {
        /// Use the remote service (GRID_REMOTE_API_URL)
        #[arg(long)]
        remote: bool,

        #[command(subcommand)]
        command: TopoCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TopoCommand {
    /// Active cells
    Activate,
    /// Deleted cells
    Deleted,
    /// Active and deleted cells together
    State,
    /// Cells covered by a stored feature
    Pick {
        #[arg(long)]
        feature_dir: String,
    },
    /// Persist the current topology
    Save,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = args.api_url {
        config.base_url = url;
    }

    match args.command {
        Command::Inspect { path } => {
            let bytes = tokio::fs::read(&path).await?;
            let snapshot = decode(&bytes)?;
            print_snapshot(&snapshot, args.json)?;
        }
        Command::Encode { levels, ids, out } => {
            let bytes = encode(&GridSnapshot::new(levels, ids))?;
            tokio::fs::write(&out, &bytes).await?;
            info!("wrote {} bytes to {}", bytes.len(), out.display());
        }
        Command::Fetch { url, post } => {
            let client = GridClient::new(config)?;
            let snapshot = match post {
                Some(body) => {
                    let payload: serde_json::Value = serde_json::from_str(&body)?;
                    client.fetch_via_post(&url, &payload).await?
                }
                None => client.fetch_via_get(&url).await?,
            };
            print_snapshot(&snapshot, args.json)?;
        }
        Command::Cell {
            rules,
            level,
            global_id,
        } => {
            let record = GridRecord::new(GridContext::new(WORLD_BBOX, rules))?;
            let report = CellReport::of(&record, level, global_id);
            if args.json {
                print_json(&report)?;
            } else {
                print!("{report}");
            }
        }
        Command::Topo { remote, command } => {
            let client = GridClient::new(config)?;
            let topo = client.topology();
            match command {
                TopoCommand::Activate => {
                    print_snapshot(&topo.activate_info(remote).await?, args.json)?
                }
                TopoCommand::Deleted => {
                    print_snapshot(&topo.deleted_info(remote).await?, args.json)?
                }
                TopoCommand::State => {
                    let state = topo.topology_state(remote).await?;
                    if args.json {
                        print_json(&state)?;
                    } else {
                        print!("{}", SnapshotSummary::of_topology(&state));
                        let deleted = deleted_hits(&state).snapshot();
                        println!("deleted ordinals: {deleted:?}");
                    }
                }
                TopoCommand::Pick { feature_dir } => print_snapshot(
                    &topo.pick_by_feature(&feature_dir, remote).await?,
                    args.json,
                )?,
                TopoCommand::Save => {
                    let receipt = topo.save(remote).await?;
                    if args.json {
                        print_json(&receipt)?;
                    } else {
                        println!("success: {} ({})", receipt.success, receipt.message);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &GridSnapshot, json: bool) -> Result<(), serde_json::Error> {
    if json {
        print_json(snapshot)
    } else {
        print!("{}", SnapshotSummary::of(snapshot));
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
