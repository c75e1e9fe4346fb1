use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use knx_devices as devices;
use knx_dpt::{Codec, DptValue, Transcoder};
use knx_telegram::{MockBus, Payload};

#[derive(Parser, Debug)]
#[command(
    name = "knx",
    version,
    about = "KNX datapoint and device tool",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered transcoders
    DptList {
        /// Only show this DPT main number
        #[arg(long)]
        main: Option<u16>,
    },
    /// Show one transcoder as JSON
    DptLookup {
        /// value_type or DPT id (e.g. temperature, 9.001, DPST-9-1)
        query: String,
    },
    /// Encode a value and print the payload as hex
    Encode {
        query: String,
        /// Number or text, depending on the transcoder
        value: String,
    },
    /// Decode a hex payload (e.g. 0c1a or 0x0C1A)
    Decode { query: String, hex: String },
    /// Load a device config against the mock bus and list the devices
    DevicesCheck {
        /// YAML config file
        config: String,
        /// Send state reads and print the telegrams that went out
        #[arg(long, action = ArgAction::SetTrue)]
        sync: bool,
        /// Print prometheus metrics after loading
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
}

#[derive(Serialize)]
struct DptInfo<'a> {
    value_type: &'a str,
    dpt_id: String,
    unit: Option<&'a str>,
    payload_length: usize,
    codec: &'a Codec,
}

impl<'a> From<&'a Transcoder> for DptInfo<'a> {
    fn from(tc: &'a Transcoder) -> Self {
        Self {
            value_type: tc.value_type,
            dpt_id: tc.dpt_id(),
            unit: tc.unit,
            payload_length: tc.payload_length(),
            codec: &tc.codec,
        }
    }
}

#[derive(Serialize)]
struct Decoded<'a> {
    value_type: &'a str,
    value: DptValue,
    unit: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::DptList { main } => dpt_list(main),
        Commands::DptLookup { query } => dpt_lookup(&query),
        Commands::Encode { query, value } => encode(&query, &value),
        Commands::Decode { query, hex } => decode(&query, &hex),
        Commands::DevicesCheck {
            config,
            sync,
            metrics,
        } => devices_check(&config, sync, metrics).await,
    }
}

fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dpt_list(main: Option<u16>) -> Result<()> {
    for tc in knx_dpt::global()
        .iter()
        .filter(|tc| main.map_or(true, |m| tc.main == m))
    {
        println!(
            "{:<32}\t{:<8}\t{:<10}\t{}",
            tc.value_type,
            tc.dpt_id(),
            tc.unit.unwrap_or("-"),
            tc.payload_length()
        );
    }
    Ok(())
}

fn dpt_lookup(query: &str) -> Result<()> {
    let tc = knx_dpt::parse_transcoder(query)?;
    println!("{}", serde_json::to_string_pretty(&DptInfo::from(tc))?);
    Ok(())
}

fn encode(query: &str, raw: &str) -> Result<()> {
    let tc = knx_dpt::parse_transcoder(query)?;
    let value = parse_value(tc, raw);
    let payload = tc
        .encode(&value)
        .with_context(|| format!("encoding {raw:?} as {}", tc.value_type))?;
    println!("{}", hex::encode(payload));
    Ok(())
}

fn decode(query: &str, raw: &str) -> Result<()> {
    let tc = knx_dpt::parse_transcoder(query)?;
    let data = parse_hex_compact(raw)?;
    let value = tc
        .decode(&data)
        .with_context(|| format!("decoding {raw} as {}", tc.value_type))?;
    let out = Decoded {
        value_type: tc.value_type,
        value,
        unit: tc.unit,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn devices_check(path: &str, sync: bool, metrics: bool) -> Result<()> {
    let config = devices::load_config_file(path)?;
    let hub = devices::MetricsHub::new().map_err(|e| anyhow::anyhow!(e))?;
    let bus = Arc::new(MockBus::new());
    let mut devs = config
        .build(bus.clone(), None, Some(hub.dev.clone()))
        .with_context(|| format!("building devices from {path}"))?;
    info!("loaded {} devices from {path}", devs.len());

    for dev in devs.iter() {
        let addresses: Vec<String> = dev.group_addresses().iter().map(|a| a.to_string()).collect();
        println!(
            "{}\t{}\t{}",
            dev.name(),
            dev.kind().type_name(),
            addresses.join(",")
        );
    }

    if sync {
        devs.sync_all(false).await;
        for telegram in bus.take_sent() {
            let kind = match telegram.payload {
                Payload::GroupValueRead => "read",
                Payload::GroupValueWrite(_) => "write",
                Payload::GroupValueResponse(_) => "response",
                _ => "other",
            };
            println!("-> {kind}\t{}", telegram.destination);
        }
    }
    devs.shutdown().await;

    if metrics {
        print!("{}", hub.encode_text());
    }
    Ok(())
}

fn parse_value(tc: &Transcoder, raw: &str) -> DptValue {
    if matches!(tc.codec, Codec::Text { .. }) {
        return DptValue::Text(raw.to_string());
    }
    let t = raw.trim();
    if let Ok(i) = t.parse::<i64>() {
        DptValue::I64(i)
    } else if let Ok(f) = t.parse::<f64>() {
        DptValue::F64(f)
    } else {
        DptValue::Text(raw.to_string())
    }
}

fn parse_hex_compact(s: &str) -> Result<Vec<u8>> {
    let t: String = s.split_whitespace().collect();
    let t = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(&t);
    hex::decode(t).map_err(|e| anyhow::anyhow!("invalid hex '{s}': {e}"))
}
