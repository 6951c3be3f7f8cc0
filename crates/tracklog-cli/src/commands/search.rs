//! `tracklog search`: find objects matching property pairs.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{Duration, SecondsFormat};
use clap::Args;
use tracing::info;

use tracklog_core::ops;

use crate::commands::{default_concurrency, open_frame_source, parse_key_value};
use crate::container;

#[derive(Args)]
pub struct SearchArgs {
    /// Path to an ACMI file to search (repeatable)
    #[arg(long = "file", value_name = "PATH", required = true)]
    pub files: Vec<PathBuf>,

    /// key=value pair an object must carry to match (repeatable)
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub properties: Vec<(String, String)>,

    /// Print the matched objects' property snapshots
    #[arg(long = "print-properties")]
    pub print_properties: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of parallel parsing workers
    #[arg(long, value_name = "N", default_value_t = default_concurrency())]
    pub concurrency: usize,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let properties: HashMap<String, String> = args.properties.iter().cloned().collect();
    if properties.is_empty() {
        bail!("no properties to search for");
    }

    for path in &args.files {
        info!("processing {}", path.display());

        let input = container::open_input(path).await?;
        let mut reader = open_frame_source(input).await?;
        let reference_time = reader.header().reference_time;

        let results = ops::search(&mut *reader, args.concurrency, &properties).await?;

        if args.json {
            println!("{}", serde_json::to_string(&results)?);
            continue;
        }
        for result in &results {
            let first = reference_time + Duration::seconds(result.first_seen as i64);
            let last = reference_time + Duration::seconds(result.last_seen as i64);
            println!("Object {}", result.object.id);
            println!(
                "  First Seen: {} ({})",
                first.to_rfc3339_opts(SecondsFormat::Secs, true),
                result.first_seen
            );
            println!(
                "  Last Seen:  {} ({})",
                last.to_rfc3339_opts(SecondsFormat::Secs, true),
                result.last_seen
            );
            if args.print_properties {
                for property in &result.object.properties {
                    println!("  {} = {}", property.key, property.value);
                }
            }
        }
    }

    Ok(())
}
