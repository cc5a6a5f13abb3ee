//! CLI command implementations for `apix`.
//!
//! - [`serve`] -- run the HTTP gateway.
//! - [`plan`] -- dry-run route selection and queue construction.
//! - [`run`] -- execute one request against the live services.
//! - [`config_cmd`] -- show or check the resolved configuration.

pub mod config_cmd;
pub mod plan;
pub mod run;
pub mod serve;

use std::path::Path;

use clap::Args;

use apix_platform::Platform;
use apix_types::config::Config;
use apix_types::request::PipelineRequest;

/// Arguments describing a single request, shared by `plan` and `run`.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,

    /// HTTP method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Request URI (path plus optional query).
    #[arg(short, long)]
    pub uri: String,

    /// Request header as `name:value`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Request payload, or `@path` to read it from a file.
    #[arg(short, long)]
    pub data: Option<String>,
}

/// Load configuration from the given path override or via auto-discovery.
///
/// Discovery order: `APIX_CONFIG`, `~/.apix/config.json`,
/// `~/.apix/config.toml`. Returns a default `Config` if none is found.
pub async fn load_config<P: Platform>(
    platform: &P,
    config_override: Option<&str>,
) -> anyhow::Result<Config> {
    apix_platform::config_loader::load_config(
        platform.fs(),
        platform.env(),
        config_override.map(Path::new),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))
}

/// Split a `name:value` header argument.
pub fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        anyhow::bail!("invalid header '{raw}': expected NAME:VALUE");
    };
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("invalid header '{raw}': empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Build the [`PipelineRequest`] described by the command-line arguments.
pub async fn request_from_args<P: Platform>(
    platform: &P,
    args: &RequestArgs,
) -> anyhow::Result<PipelineRequest> {
    let mut request = PipelineRequest::new(&args.method, &args.uri);

    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(&name, value);
    }

    match args.data.as_deref() {
        Some(data) => {
            let payload = match data.strip_prefix('@') {
                Some(path) => platform
                    .fs()
                    .read_to_string(Path::new(path))
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to read payload file {path}: {e}"))?,
                None => data.to_string(),
            };
            Ok(request.with_payload(payload))
        }
        None => Ok(request),
    }
}
