use anyhow::Context;
use std::path::PathBuf;
use tracing::info;
use wrapped::config;

#[derive(Debug, Default)]
struct CliArgs {
    data: Option<PathBuf>,
    bind: Option<String>,
    summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1).collect())?;

    let mut settings = config::load_settings()?;
    settings.apply_env_overrides();
    if let Some(path) = args.data {
        settings.data_path = path;
    }
    if let Some(addr) = args.bind {
        settings.bind_addr = addr;
    }
    info!(version = env!("CARGO_PKG_VERSION"), ?settings, "starting");

    let dataset = wrapped::dataset::load_dataset(&settings.data_path)?;

    if args.summary {
        let analysis = wrapped::stats::analyze(&dataset, &settings.analysis_options())?;
        let json = serde_json::to_string_pretty(&analysis).context("failed to encode analysis")?;
        println!("{json}");
        return Ok(());
    }

    wrapped::server::serve(settings, dataset).await
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--data" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--data requires a csv path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--data cannot be empty");
                }
                out.data = Some(PathBuf::from(value.trim()));
            }
            "--bind" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--bind requires host:port value");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--bind cannot be empty");
                }
                out.bind = Some(value.trim().to_string());
            }
            "--summary" => out.summary = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("wrapped");
    println!("  --data PATH       Song play-count csv (song_name,artist,genre,play_count)");
    println!("  --bind host:port  HTTP bind address");
    println!("  --summary         Print the analysis as json and exit");
}
