// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cumulus CLI entrypoint.
//!
//! By default this serves the generation API at `http://127.0.0.1:<port>/api/generate` and MCP over
//! streamable HTTP at `http://127.0.0.1:<port>/mcp`.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool integrations).

use std::error::Error;
use std::sync::Arc;

use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cumulus::config::{AgentConfig, API_KEY_ENV};
use cumulus::llm::HttpModelClient;
use cumulus::mcp::CumulusMcp;
use cumulus::model::Graph;
use cumulus::server::{router, AppState};

const DEFAULT_HTTP_PORT: u16 = 27436;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--port <port>] [--model <name>] [--max-turns <n>] [--no-continuation]\n  {program} --mcp\n\nHTTP mode (default) serves `POST /api/generate` (SSE) and MCP over streamable HTTP at\n`http://127.0.0.1:<port>/mcp`. --port selects the port (0 = ephemeral; default {DEFAULT_HTTP_PORT}).\nHTTP mode needs {API_KEY_ENV}.\n\n--mcp serves the graph tools over stdio and needs no model access.\n\nSet RUST_LOG to adjust logging (default: info, written to stderr)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    port: Option<u16>,
    model: Option<String>,
    max_turns: Option<u32>,
    no_continuation: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.port = Some(port);
            }
            "--model" => {
                if options.model.is_some() {
                    return Err(());
                }
                let model = args.next().filter(|model| !model.trim().is_empty()).ok_or(())?;
                options.model = Some(model);
            }
            "--max-turns" => {
                if options.max_turns.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let turns: u32 = raw.parse().map_err(|_| ())?;
                if turns == 0 {
                    return Err(());
                }
                options.max_turns = Some(turns);
            }
            "--no-continuation" => {
                if options.no_continuation {
                    return Err(());
                }
                options.no_continuation = true;
            }
            _ => return Err(()),
        }
    }

    if options.mcp && options.port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn apply_options(config: &mut AgentConfig, options: &CliOptions) {
    if let Some(model) = options.model.as_ref() {
        config.model = model.clone();
    }
    if let Some(max_turns) = options.max_turns {
        config.max_turns = max_turns;
    }
    if options.no_continuation {
        config.continuation = false;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "cumulus".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();

        if options.mcp {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            runtime.block_on(CumulusMcp::new(Graph::new()).serve_stdio())?;
            return Ok(());
        }

        let mut config = AgentConfig::from_env();
        apply_options(&mut config, &options);
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| format!("{API_KEY_ENV} is not set (required in HTTP mode)"))?;
        let client =
            HttpModelClient::new(api_key, config.base_url.clone(), config.connect_timeout)?;
        let port = options.port.unwrap_or(DEFAULT_HTTP_PORT);

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
            info!(addr = %listener.local_addr()?, model = %config.model, "listening");

            let mcp_config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = mcp_config.cancellation_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service = {
                let mcp = CumulusMcp::new(Graph::new());
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, mcp_config)
            };

            let app = router(AppState::new(Arc::new(client), config))
                .nest_service("/mcp", mcp_service);
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("shutting down");
                    }
                    shutdown_token.cancel();
                })
                .await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("cumulus: {err}");
        std::process::exit(1);
    }
}
