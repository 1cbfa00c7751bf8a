use anyhow::Result;
use clap::{Parser, Subcommand};
use simple_storage_sdk::eth::{DEFAULT_CONTRACT_ADDRESS, FUJI_RPC_URL};
use simple_storage_sdk::events::{DEFAULT_LIMIT, DEFAULT_LOOKBACK_BLOCKS, DEFAULT_PAGE};
use simple_storage_sdk::signers::{load_default_private_key, load_private_key};
use simple_storage_sdk::utils::format_balance;
use simple_storage_sdk::wallet::BALANCE_DISPLAY_DECIMALS;
use simple_storage_sdk::{Address, EventsQuery, PrivateKeySigner, SimpleStorageClient, U256, Url};
use std::path::PathBuf;

/// Read, write and list events of the SimpleStorage contract on Avalanche Fuji
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the RPC node
    #[arg(long, env = "RPC_URL", default_value = FUJI_RPC_URL)]
    rpc_url: Url,

    /// Address of the SimpleStorage contract
    #[arg(long, env = "CONTRACT_ADDRESS", default_value_t = DEFAULT_CONTRACT_ADDRESS)]
    contract_address: Address,

    /// Private key file. Defaults to `private.key` in the config folder.
    #[arg(long, env = "PRIVATE_KEY_FILE")]
    private_key_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the wallet address, network and balance
    Wallet,
    /// Show the native balance of an address, or of the wallet
    Balance {
        address: Option<Address>,
    },
    /// Read or write the stored value
    Value {
        #[command(subcommand)]
        command: ValueCommand,
    },
    /// List ValueUpdated events, newest range by default
    Events {
        #[arg(long)]
        from_block: Option<u64>,
        #[arg(long)]
        to_block: Option<u64>,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Print the current block number
    WaitBlock,
}

#[derive(Subcommand, Debug)]
enum ValueCommand {
    /// Print the stored value
    Get,
    /// Store a new value
    Set { value: U256 },
}

impl Command {
    fn needs_wallet(&self) -> bool {
        matches!(
            self,
            Command::Wallet
                | Command::Balance { address: None }
                | Command::Value {
                    command: ValueCommand::Set { .. }
                }
        )
    }

    async fn execute(&self, client: &SimpleStorageClient) -> Result<()> {
        match self {
            Command::Wallet => self.handle_wallet(client).await,
            Command::Balance { address } => self.handle_balance(client, *address).await,
            Command::Value { command } => command.execute(client).await,
            Command::Events {
                from_block,
                to_block,
                page,
                limit,
            } => {
                self.handle_events(client, *from_block, *to_block, *page, *limit)
                    .await
            }
            Command::WaitBlock => self.handle_wait_block(client).await,
        }
    }

    async fn handle_wallet(&self, client: &SimpleStorageClient) -> Result<()> {
        let status = client
            .wallet_status()
            .await
            .map_err(|e| anyhow::anyhow!(e.wallet_message()))?;
        println!("Status:  {}", status.status_message());
        println!("Address: {} ({})", status.address, status.short_address());
        println!("Network: {} (chain {})", status.network_name(), status.chain_id);
        println!("Balance: {} AVAX", status.display_balance());
        Ok(())
    }

    async fn handle_balance(
        &self,
        client: &SimpleStorageClient,
        address: Option<Address>,
    ) -> Result<()> {
        let address = address
            .or_else(|| client.owner_address())
            .ok_or_else(|| anyhow::anyhow!("No address given and no wallet configured"))?;
        let wei = client.get_balance_wei(address).await?;
        println!(
            "{address}: {} AVAX",
            format_balance(wei, BALANCE_DISPLAY_DECIMALS)
        );
        Ok(())
    }

    async fn handle_events(
        &self,
        client: &SimpleStorageClient,
        from_block: Option<u64>,
        to_block: Option<u64>,
        page: u32,
        limit: u32,
    ) -> Result<()> {
        let query = match (from_block, to_block) {
            (Some(from_block), Some(to_block)) => EventsQuery::new(from_block, to_block),
            (from_block, to_block) => {
                let current = client.get_current_block_number().await?;
                EventsQuery::new(
                    from_block.unwrap_or(current.saturating_sub(DEFAULT_LOOKBACK_BLOCKS)),
                    to_block.unwrap_or(current),
                )
            }
        }
        .with_page(page)
        .with_limit(limit);

        let result = client.get_events_page(query).await?;
        println!(
            "ValueUpdated events in blocks {}..={} (page {}/{}, {} total):",
            query.from_block,
            query.to_block,
            result.meta.page,
            result.meta.total_pages,
            result.meta.total
        );
        for event in &result.data {
            println!(
                "  block {:>10}  value {}  tx {}",
                event.block_number, event.value, event.tx_hash
            );
        }
        Ok(())
    }

    async fn handle_wait_block(&self, client: &SimpleStorageClient) -> Result<()> {
        let block = client.get_current_block_number().await?;
        println!("Current block: {block}");
        Ok(())
    }
}

impl ValueCommand {
    async fn execute(&self, client: &SimpleStorageClient) -> Result<()> {
        match self {
            ValueCommand::Get => self.handle_get(client).await,
            ValueCommand::Set { value } => self.handle_set(client, *value).await,
        }
    }

    async fn handle_get(&self, client: &SimpleStorageClient) -> Result<()> {
        println!("{}", client.get_value().await?);
        Ok(())
    }

    async fn handle_set(&self, client: &SimpleStorageClient, value: U256) -> Result<()> {
        let tx_hash = client
            .set_value_with_status(value, |status| match status.tx_hash() {
                Some(hash) => println!("{} ({hash})", status.message()),
                None => println!("{}", status.message()),
            })
            .await?;
        log::debug!("setValue({value}) done in {tx_hash}");
        Ok(())
    }
}

fn load_wallet(path: Option<&PathBuf>) -> Result<PrivateKeySigner> {
    match path {
        Some(path) => load_private_key(path),
        None => load_default_private_key(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let wallet = if args.command.needs_wallet() {
        Some(load_wallet(args.private_key_file.as_ref())?)
    } else {
        None
    };

    let client = SimpleStorageClient::builder()
        .rpc_url(args.rpc_url)
        .contract_address(args.contract_address)
        .maybe_wallet(wallet)
        .build();

    args.command.execute(&client).await
}
