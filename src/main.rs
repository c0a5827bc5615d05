use anyhow::Context;
use clap::{Parser, Subcommand};

use tag_matrix::config::Config;
use tag_matrix::logging::{LogFormat, init_logging};
use tag_matrix::pipeline::{Mode, Pipeline};

#[derive(Parser)]
#[command(name = "tag-matrix")]
#[command(
    version,
    about = "Generates incremental container build matrices from registry tags"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Append arm64, amd64 and multi tag lists (default)
    Matrix,
    /// Append a single tag list without architecture split
    Tags,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_format);

    let config = Config::from_env().context("Invalid configuration")?;
    let mode = match cli.command {
        None | Some(Command::Matrix) => Mode::Matrix,
        Some(Command::Tags) => Mode::Plain,
    };

    // Registry requests run one after another; one thread is enough
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let pipeline = Pipeline::from_config(&config)?;
            pipeline.run(mode).await?;
            Ok::<(), anyhow::Error>(())
        })
}
