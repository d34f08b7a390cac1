//! `vwire-inspect`: decode virtual-world protocol packets and print what
//! they contain.
//!
//! # Usage
//!
//! ```text
//! vwire-inspect [OPTIONS]
//!
//! Options:
//!   --config <PATH>    TOML config file
//!   --hex <HEX>        Decode one packet given as hex (repeatable)
//!   --file <PATH>      Decode one hex packet per line ("-" reads stdin)
//!   --listen [ADDR]    Decode every UDP datagram received on ADDR
//!   --count <N>        Stop listening after N datagrams
//!   --json             Emit JSON lines instead of text
//! ```
//!
//! Reports go to stdout; logs go to stderr.  `RUST_LOG` overrides the
//! config file's `log_level`.
//!
//! Hex inputs are decoded first, then the file, then listen mode starts.

use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vwire_core::default_registry;
use vwire_inspect::config::{load_config, InspectConfig, OutputFormat};
use vwire_inspect::hex::{parse_hex, parse_hex_lines};
use vwire_inspect::listen::{bind, listen};
use vwire_inspect::report::{run_batch, Inspector, WriterSink};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Decode virtual-world protocol packets from hex dumps or a UDP port.
#[derive(Debug, Parser)]
#[command(name = "vwire-inspect", version)]
struct Cli {
    /// TOML configuration file. A missing file means defaults.
    #[arg(long, value_name = "PATH", env = "VWIRE_INSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Decode one packet written as hex. May be given more than once.
    #[arg(long = "hex", value_name = "HEX")]
    hex: Vec<String>,

    /// Decode one hex packet per line. `#` comments and blank lines are
    /// skipped; `-` reads stdin.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Bind a UDP socket and decode every datagram until Ctrl+C.
    ///
    /// Without a value, the config's `listen.bind_address` is used.
    #[arg(long, value_name = "ADDR", num_args = 0..=1)]
    listen: Option<Option<String>>,

    /// Stop listening after this many datagrams.
    #[arg(long, value_name = "N", requires = "listen")]
    count: Option<usize>,

    /// Emit JSON reports instead of text (overrides the config).
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn output_format(&self, config: &InspectConfig) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            config.inspect.format
        }
    }

    /// Address for listen mode, or `None` when `--listen` was not given.
    fn listen_addr(&self, config: &InspectConfig) -> anyhow::Result<Option<SocketAddr>> {
        let Some(arg) = &self.listen else {
            return Ok(None);
        };
        let text = arg.as_deref().unwrap_or(&config.listen.bind_address);
        let addr = text
            .parse()
            .with_context(|| format!("invalid listen address: '{text}'"))?;
        Ok(Some(addr))
    }

    /// Collects the `--hex` arguments and `--file` lines as labelled frames.
    fn batch_frames(&self) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
        let mut frames = Vec::new();
        for (i, text) in self.hex.iter().enumerate() {
            let label = format!("--hex #{}", i + 1);
            let bytes = parse_hex(text, &label)?;
            frames.push((label, bytes));
        }

        if let Some(path) = &self.file {
            let text = if path.as_os_str() == "-" {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read hex packets from stdin")?;
                text
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?
            };
            for (line, bytes) in parse_hex_lines(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
            {
                frames.push((format!("line {line}"), bytes));
            }
        }
        Ok(frames)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    // RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.inspect.log_level)),
        )
        .init();

    let listen_addr = cli.listen_addr(&config)?;
    let frames = cli.batch_frames()?;
    if frames.is_empty() && listen_addr.is_none() {
        bail!("nothing to inspect: pass --hex, --file or --listen");
    }

    let inspector = Inspector::new(default_registry(), &config.inspect);
    let mut sink = WriterSink::new(std::io::stdout(), cli.output_format(&config));

    if !frames.is_empty() {
        let summary = run_batch(&inspector, frames, &mut sink).context("failed to write report")?;
        info!("{summary}");
    }

    if let Some(addr) = listen_addr {
        let socket = bind(addr).await?;
        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("received Ctrl+C, stopping"),
                Err(e) => {
                    error!("failed to listen for Ctrl+C signal: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };
        listen(&socket, &inspector, &mut sink, cli.count, shutdown)
            .await
            .context("failed to write report")?;
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
