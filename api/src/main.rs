use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use simple_storage_sdk::eth::{DEFAULT_CONTRACT_ADDRESS, FUJI_RPC_URL};
use simple_storage_sdk::events::DEFAULT_LOOKBACK_BLOCKS;
use simple_storage_sdk::resilient_provider::ResilientProviderConfig;
use simple_storage_sdk::{Address, SimpleStorageClient, Url};
use std::time::Duration;

mod api;
mod error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// RPC endpoint of the chain the contract is deployed on
    #[arg(long, env = "RPC_URL", default_value = FUJI_RPC_URL)]
    rpc_url: Url,

    /// Address of the SimpleStorage contract
    #[arg(long, env = "CONTRACT_ADDRESS", default_value_t = DEFAULT_CONTRACT_ADDRESS)]
    contract_address: Address,

    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind_addr: String,

    /// Upper bound on a single RPC request, in seconds
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value_t = 10)]
    rpc_timeout_secs: u64,

    /// Blocks looked back from the head when `fromBlock` is not given
    #[arg(long, env = "DEFAULT_LOOKBACK_BLOCKS", default_value_t = DEFAULT_LOOKBACK_BLOCKS)]
    default_lookback_blocks: u64,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let client = SimpleStorageClient::builder()
        .rpc_url(cli.rpc_url.clone())
        .contract_address(cli.contract_address)
        .provider_config(
            ResilientProviderConfig::default()
                .with_request_timeout(Duration::from_secs(cli.rpc_timeout_secs)),
        )
        .build();
    let state = web::Data::new(api::AppState {
        client,
        default_lookback: cli.default_lookback_blocks,
    });

    log::info!(
        "Serving SimpleStorage {} via {} on http://{}",
        cli.contract_address,
        cli.rpc_url,
        cli.bind_addr
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind(&cli.bind_addr)?
    .run()
    .await?;

    Ok(())
}
