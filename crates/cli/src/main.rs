//! Command Line Interface for the concentrated-liquidity quoting engine.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clmm_quote_domain::address::Address;
use clmm_quote_domain::fees::fee_rate_to_decimal;
use clmm_quote_domain::math::price_tick::{price_to_tick, sqrt_price_x64_to_price};
use clmm_quote_domain::math::tick_math::{sqrt_price_at_tick, tick_at_sqrt_price};
use clmm_quote_domain::tick::tick_array_start_index;
use clmm_quote_domain::value_objects::Percentage;
use clmm_quote_protocols::prelude::*;
use clmm_quote_simulation::state::SwapAmount;
use dotenv::dotenv;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clmm-quote")]
#[command(about = "Concentrated-liquidity swap quoting CLI", long_about = None)]
struct Cli {
    /// Pool fixture file (JSON array of pools)
    #[arg(long, global = true, env = "CLMM_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Tick arrays fetched on each side of the current one
    #[arg(long, global = true, env = "CLMM_PREFETCH_RADIUS", default_value_t = 0)]
    prefetch_radius: u8,

    /// Program id used to derive tick array addresses
    #[arg(long, global = true, default_value = "11111111111111111111111111111111")]
    program_id: Address,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a swap against one pool
    Quote {
        /// Pool address
        #[arg(long)]
        pool: Address,

        /// Input mint, or output mint with --exact-output
        #[arg(long)]
        mint: Address,

        /// Amount in raw token units
        #[arg(long)]
        amount: u128,

        /// Fix the output amount instead of the input
        #[arg(long)]
        exact_output: bool,

        /// Stop the swap at this tick's price
        #[arg(long, allow_hyphen_values = true)]
        limit_tick: Option<i32>,

        /// Slippage tolerance in basis points
        #[arg(long, default_value_t = 50)]
        slippage_bps: u32,

        /// Maximum number of swap steps
        #[arg(long)]
        max_steps: Option<usize>,
    },
    /// Quote an exact-input swap through several pools
    Route {
        /// Pool addresses in hop order, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        pools: Vec<Address>,

        /// Mint sold to the first pool
        #[arg(long)]
        input_mint: Address,

        /// Amount in raw token units
        #[arg(long)]
        amount: u128,
    },
    /// Convert between ticks, prices and sqrt prices
    Tick {
        /// Tick index
        #[arg(long, allow_hyphen_values = true, conflicts_with = "price")]
        tick: Option<i32>,

        /// Price of token0 in token1
        #[arg(long)]
        price: Option<Decimal>,

        /// Tick spacing used to locate the tick array
        #[arg(long, default_value_t = 64)]
        tick_spacing: u16,
    },
    /// Show a pool's state and prices
    Price {
        /// Pool address
        #[arg(long)]
        pool: Address,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn load_store(path: Option<&Path>, locator: &SeedLocator) -> Result<Arc<InMemoryStateStore>> {
    let path = path.context("no fixture given; pass --fixture or set CLMM_FIXTURE")?;
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let fixtures = PoolFixture::parse_list(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let store = InMemoryStateStore::from_fixtures(&fixtures, locator)?;
    info!(path = %path.display(), pools = fixtures.len(), "Loaded fixture");
    Ok(Arc::new(store))
}

/// Store and cache settings shared by the pool-backed commands.
struct Session {
    store: Arc<InMemoryStateStore>,
    locator: Arc<SeedLocator>,
    config: CacheConfig,
}

impl Session {
    async fn pool(&self, address: Address) -> Result<AmmPool> {
        let pool = AmmPool::load(
            address,
            Arc::clone(&self.store) as Arc<dyn StateStore>,
            Arc::clone(&self.locator) as Arc<dyn TickArrayLocator>,
            self.config,
        )
        .await
        .with_context(|| format!("failed to load pool {address}"))?;
        Ok(pool)
    }
}

fn print_quote(quote: &Quote, slippage: Percentage) -> Result<()> {
    let mut table = Table::new();
    table.add_row(row!["Direction", quote.direction.label()]);
    table.add_row(row!["Amount in", quote.amount_in()]);
    table.add_row(row!["Amount out", quote.amount_out()]);
    table.add_row(row!["Unfilled", quote.amount_remaining]);
    table.add_row(row!["Slippage (bps)", slippage.to_bps()]);
    match quote.specified {
        SwapAmount::ExactInput(_) => {
            table.add_row(row!["Minimum out", quote.min_amount_out(slippage)?]);
        }
        SwapAmount::ExactOutput(_) => {
            table.add_row(row!["Maximum in", quote.max_amount_in(slippage)?]);
        }
    }
    table.add_row(row!["Sqrt price after", quote.sqrt_price_after]);
    table.add_row(row!["Tick after", quote.tick_after]);
    table.add_row(row!["Liquidity after", quote.liquidity_after]);
    for array in &quote.touched_arrays {
        table.add_row(row!["Tick array", format!("{} ({})", array.address, array.start_index)]);
    }
    table.printstd();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CacheConfig::default().with_prefetch_radius(cli.prefetch_radius);
    config.validate()?;
    let locator = Arc::new(SeedLocator::new(cli.program_id));
    info!(
        program_id = %locator.program_id(),
        radius = config.prefetch_radius,
        "Configured tick array loading"
    );

    match &cli.command {
        Commands::Tick {
            tick,
            price,
            tick_spacing,
        } => {
            let tick = match (tick, price) {
                (Some(tick), _) => *tick,
                (None, Some(price)) => price_to_tick(*price)?,
                (None, None) => anyhow::bail!("pass --tick or --price"),
            };
            let sqrt_price = sqrt_price_at_tick(tick)?;
            let mut table = Table::new();
            table.add_row(row!["Tick", tick]);
            table.add_row(row!["Sqrt price (64.64)", sqrt_price]);
            table.add_row(row!["Price", sqrt_price_x64_to_price(sqrt_price)?]);
            table.add_row(row!["Tick of sqrt price", tick_at_sqrt_price(sqrt_price)?]);
            table.add_row(row![
                "Tick array start",
                tick_array_start_index(tick, *tick_spacing)?
            ]);
            table.printstd();
        }
        Commands::Price { pool } => {
            let session = Session {
                store: load_store(cli.fixture.as_deref(), &locator)?,
                locator,
                config,
            };
            let pool = session.pool(*pool).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(pool.state())?);
                return Ok(());
            }
            let state = pool.state();
            let mut table = Table::new();
            table.add_row(row!["Pool", pool.address()]);
            table.add_row(row!["Token 0", state.token_mint0]);
            table.add_row(row!["Token 1", state.token_mint1]);
            table.add_row(row!["Tick", state.tick]);
            table.add_row(row!["Sqrt price (64.64)", state.sqrt_price_x64]);
            table.add_row(row!["Liquidity", state.liquidity]);
            table.add_row(row!["Fee rate", fee_rate_to_decimal(state.fee_rate)]);
            table.add_row(row!["Token 0 price", pool.token0_price()?.value]);
            table.add_row(row!["Token 1 price", pool.token1_price()?.value]);
            table.printstd();
        }
        Commands::Quote {
            pool,
            mint,
            amount,
            exact_output,
            limit_tick,
            slippage_bps,
            max_steps,
        } => {
            let session = Session {
                store: load_store(cli.fixture.as_deref(), &locator)?,
                locator,
                config,
            };
            let mut pool = session.pool(*pool).await?;
            if let Some(max_steps) = max_steps {
                pool = pool.with_max_steps(*max_steps);
            }
            let limit = limit_tick.map(sqrt_price_at_tick).transpose()?;
            let quote = if *exact_output {
                pool.simulate_exact_output(mint, *amount, limit)?
            } else {
                pool.simulate_exact_input(mint, *amount, limit)?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                print_quote(&quote, Percentage::from_bps(*slippage_bps))?;
            }
        }
        Commands::Route {
            pools,
            input_mint,
            amount,
        } => {
            let session = Session {
                store: load_store(cli.fixture.as_deref(), &locator)?,
                locator,
                config,
            };
            let mut loaded = Vec::with_capacity(pools.len());
            for address in pools {
                loaded.push(session.pool(*address).await?);
            }
            let route = quote_route_exact_input(&mut loaded, input_mint, *amount)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&route)?);
                return Ok(());
            }
            let mut table = Table::new();
            table.add_row(row!["Hop", "Pool", "In", "Out", "Tick arrays"]);
            for (index, hop) in route.hops.iter().enumerate() {
                table.add_row(row![
                    index,
                    hop.pool,
                    hop.amount_in,
                    hop.quote.amount,
                    hop.quote.touched_arrays.len()
                ]);
            }
            table.printstd();
            println!("Amount out: {}", route.amount_out);
            println!("Remaining accounts: {}", route.remaining_accounts().len());
        }
    }

    Ok(())
}
