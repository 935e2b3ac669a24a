mod config;
mod error;
mod seed;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use gateway::{Gateway, OrderRequest};
use policy::{Action, CartLine, Identity, RestaurantListing};
use rust_decimal::Decimal;
use serde::Serialize;
use storage::{MemoryOrderStore, Order, OrderId, OrderStore, SqliteOrderStore};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "tablegate.toml";

#[derive(Parser)]
#[command(name = "tablegate")]
#[command(about = "Role and region gated ordering for the demo storefront", long_about = None)]
#[command(version)]
struct Cli {
    /// Keep orders in memory for this invocation only
    #[arg(long, global = true)]
    memory: bool,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List demo accounts
    Users,
    /// Show the restaurants a user may order from
    Catalog {
        #[arg(short, long)]
        user: String,
    },
    /// Show the orders a user may see
    Orders {
        #[arg(short, long)]
        user: String,
    },
    /// Pay for an order
    Place {
        #[arg(short, long)]
        user: String,
        /// Restaurant id (e.g. r1)
        #[arg(short, long)]
        restaurant: String,
        /// Cart line as PRICExQTY, repeatable
        #[arg(short, long = "line", value_parser = parse_line, required = true)]
        lines: Vec<CartLine>,
    },
    /// Cancel a pending order
    Cancel {
        #[arg(short, long)]
        user: String,
        /// Order ID (prefix match among the user's own orders)
        #[arg(short, long)]
        order: String,
    },
    /// Price a cart without placing it
    Quote {
        #[arg(short, long = "line", value_parser = parse_line, required = true)]
        lines: Vec<CartLine>,
    },
    /// Show payment settings (admins only)
    Settings {
        #[arg(short, long)]
        user: String,
    },
    /// Start an interactive session
    Shell {
        #[arg(short, long)]
        user: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(CONFIG_FILE)?;
    let gateway = build_gateway(&config, cli.memory)?;
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Users => cmd_users(&out),
        Commands::Catalog { user } => cmd_catalog(&gateway, &login(&user)?, &out),
        Commands::Orders { user } => cmd_orders(&gateway, &login(&user)?, &out),
        Commands::Place {
            user,
            restaurant,
            lines,
        } => cmd_place(&gateway, &login(&user)?, restaurant, lines, &out),
        Commands::Cancel { user, order } => cmd_cancel(&gateway, &login(&user)?, &order, &out),
        Commands::Quote { lines } => cmd_quote(&gateway, &lines, &out),
        Commands::Settings { user } => cmd_settings(&gateway, &login(&user)?, &out),
        Commands::Shell { user } => shell::run(&gateway, login(&user)?),
    }
}

type AppGateway = Gateway<dyn OrderStore>;

fn build_gateway(config: &Config, memory: bool) -> Result<AppGateway> {
    let store: Arc<dyn OrderStore> = if memory {
        Arc::new(MemoryOrderStore::new())
    } else {
        let path = match &config.store.path {
            Some(path) => path.clone(),
            None => dirs_data_dir().ok_or(Error::NoDataDir)?.join("orders.db"),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "opening order store");
        Arc::new(SqliteOrderStore::open(&path)?)
    };
    seed::seed_orders(store.as_ref())?;

    Ok(Gateway::new(store, seed::catalog()?, config.policy.clone()))
}

fn login(user: &str) -> Result<Identity> {
    Ok(seed::find_user(user)?.identity())
}

/// Parse a cart line written as `PRICExQTY`, e.g. `15.99x2`.
fn parse_line(s: &str) -> std::result::Result<CartLine, String> {
    let (price, qty) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected PRICExQTY, got '{s}'"))?;
    let unit_price: Decimal = price
        .trim()
        .parse()
        .map_err(|e| format!("bad price '{price}': {e}"))?;
    let quantity: u32 = qty
        .trim()
        .parse()
        .map_err(|e| format!("bad quantity '{qty}': {e}"))?;
    Ok(CartLine::new(unit_price, quantity))
}

/// Resolve a full order id, or a prefix of one of the orders `identity`
/// can see.
fn resolve_order(gateway: &AppGateway, identity: &Identity, prefix: &str) -> Result<OrderId> {
    if let Ok(id) = prefix.parse::<OrderId>() {
        return Ok(id);
    }

    let orders = gateway.request_orders(identity)?;
    let matching: Vec<_> = orders
        .iter()
        .filter(|o| o.id.to_string().starts_with(prefix))
        .collect();

    match matching.as_slice() {
        [] => Err(Error::OrderNotFound {
            prefix: prefix.to_string(),
        }),
        [only] => Ok(only.id),
        _ => Err(Error::AmbiguousOrder {
            prefix: prefix.to_string(),
            matches: matching.iter().map(|o| o.id.to_string()).collect(),
        }),
    }
}

struct Output {
    json: bool,
}

impl Output {
    /// Print `value` as JSON when requested, otherwise run `table`.
    fn emit<T: Serialize + ?Sized>(&self, value: &T, table: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            table();
        }
        Ok(())
    }
}

fn cmd_users(out: &Output) -> Result<()> {
    out.emit(seed::USERS, || {
        println!("{:<4}  {:<18}  {:<8}  REGION", "ID", "NAME", "ROLE");
        println!("{}", "-".repeat(44));
        for user in seed::USERS {
            println!(
                "{:<4}  {:<18}  {:<8}  {}",
                user.id, user.name, user.role, user.region
            );
        }
    })
}

fn cmd_catalog(gateway: &AppGateway, identity: &Identity, out: &Output) -> Result<()> {
    let listings = gateway.request_catalog(identity);
    out.emit(&listings, || print_listings(identity, &listings))
}

pub(crate) fn print_listings(identity: &Identity, listings: &[&RestaurantListing]) {
    if listings.is_empty() {
        println!("No restaurants found for region {}.", identity.region());
        return;
    }
    println!(
        "{:<4}  {:<20}  {:<8}  {:<18}  {:<6}  {:<10}  PRICE",
        "ID", "NAME", "REGION", "CUISINE", "RATING", "DELIVERY"
    );
    println!("{}", "-".repeat(84));
    for l in listings {
        println!(
            "{:<4}  {:<20}  {:<8}  {:<18}  {:<6.1}  {:<10}  {}",
            l.id, l.name, l.region, l.cuisine, l.rating, l.delivery_time, l.price_range
        );
    }
}

fn cmd_orders(gateway: &AppGateway, identity: &Identity, out: &Output) -> Result<()> {
    let orders = gateway.request_orders(identity)?;
    out.emit(&orders, || print_orders(&orders))
}

pub(crate) fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders found.");
        return;
    }
    println!(
        "{:<36}  {:<5}  {:<20}  {:<6}  {:>9}  {:<10}  PLACED",
        "ORDER ID", "OWNER", "RESTAURANT", "ITEMS", "TOTAL", "STATUS"
    );
    println!("{}", "-".repeat(110));
    for order in orders {
        let placed = Local
            .from_utc_datetime(&order.created_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        println!(
            "{:<36}  {:<5}  {:<20}  {:<6}  {:>9}  {:<10}  {placed}",
            order.id,
            order.owner,
            order.restaurant,
            order.item_count,
            format!("${:.2}", order.total),
            order.status
        );
    }
}

fn cmd_place(
    gateway: &AppGateway,
    identity: &Identity,
    restaurant_id: String,
    lines: Vec<CartLine>,
    out: &Output,
) -> Result<()> {
    let order = gateway.request_place_order(
        identity,
        &OrderRequest {
            restaurant_id,
            lines,
        },
    )?;
    out.emit(&order, || {
        println!("Order placed: {} (${:.2}, {})", order.id, order.total, order.status);
    })
}

/// Cancel by id or prefix. The role is checked before the prefix is looked
/// up, so a caller who may not cancel learns nothing about which orders exist.
pub(crate) fn cancel_by_prefix(
    gateway: &AppGateway,
    identity: &Identity,
    prefix: &str,
) -> Result<Order> {
    gateway.require(identity, Action::CancelOrder)?;
    let id = resolve_order(gateway, identity, prefix)?;
    Ok(gateway.request_cancel_order(identity, id)?)
}

fn cmd_cancel(gateway: &AppGateway, identity: &Identity, prefix: &str, out: &Output) -> Result<()> {
    let order = cancel_by_prefix(gateway, identity, prefix)?;
    out.emit(&order, || println!("Order cancelled: {}", order.id))
}

fn cmd_quote(gateway: &AppGateway, lines: &[CartLine], out: &Output) -> Result<()> {
    let quote = gateway.quote(lines)?;
    out.emit(&quote, || {
        println!("Subtotal      ${:.2}", quote.subtotal);
        println!("Delivery fee  ${:.2}", quote.delivery_fee);
        println!("Tax           ${:.2}", quote.tax);
        println!("Total         ${:.2}", quote.total);
    })
}

fn cmd_settings(gateway: &AppGateway, identity: &Identity, out: &Output) -> Result<()> {
    let methods = gateway.request_payment_methods(identity)?;
    out.emit(methods, || {
        println!("{:<16}  {:<20}  STATUS", "GATEWAY", "KIND");
        println!("{}", "-".repeat(50));
        for m in methods {
            let status = if m.active { "active" } else { "not connected" };
            println!("{:<16}  {:<20}  {status}", m.name, m.kind);
        }
    })
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/tablegate"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("tablegate"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("tablegate"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn memory_gateway() -> AppGateway {
        build_gateway(&Config::default(), true).unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("15.99x2").unwrap(), CartLine::new(dec!(15.99), 2));
        assert_eq!(parse_line(" 5 X 1 ").unwrap(), CartLine::new(dec!(5), 1));
        assert!(parse_line("15.99").is_err());
        assert!(parse_line("abcx2").is_err());
        assert!(parse_line("1x-2").is_err());
    }

    #[test]
    fn test_memory_gateway_is_seeded() {
        let gw = memory_gateway();
        let admin = login("u1").unwrap();
        assert_eq!(gw.request_orders(&admin).unwrap().len(), 1);
        assert!(gw.request_orders(&login("u2").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_order_by_prefix() {
        let gw = memory_gateway();
        let manager = login("u2").unwrap();
        let order = gw
            .request_place_order(
                &manager,
                &OrderRequest {
                    restaurant_id: "r1".to_string(),
                    lines: vec![CartLine::new(dec!(10), 1)],
                },
            )
            .unwrap();

        let full = order.id.to_string();
        let prefix = &full[..8];
        assert_eq!(resolve_order(&gw, &manager, prefix).unwrap(), order.id);
        assert_eq!(resolve_order(&gw, &manager, &full).unwrap(), order.id);
        assert!(matches!(
            resolve_order(&gw, &login("u3").unwrap(), prefix),
            Err(Error::OrderNotFound { .. })
        ));
    }

    #[test]
    fn test_member_cancel_by_prefix_is_denied() {
        let gw = memory_gateway();
        let admin = login("u1").unwrap();
        let seeded = gw.request_orders(&admin).unwrap()[0].id.to_string();

        let member = login("u4").unwrap();
        for prefix in [&seeded[..8], seeded.as_str(), "ffffffff"] {
            let err = cancel_by_prefix(&gw, &member, prefix).unwrap_err();
            assert!(matches!(err, Error::Gateway(ref e) if e.is_denied()), "{err:?}");
        }
    }

    #[test]
    fn test_manager_cancel_by_prefix() {
        let gw = memory_gateway();
        let manager = login("u2").unwrap();
        let order = gw
            .request_place_order(
                &manager,
                &OrderRequest {
                    restaurant_id: "r1".to_string(),
                    lines: vec![CartLine::new(dec!(10), 1)],
                },
            )
            .unwrap();
        let full = order.id.to_string();

        let cancelled = cancel_by_prefix(&gw, &manager, &full[..8]).unwrap();
        assert_eq!(cancelled.id, order.id);
        assert!(matches!(
            cancel_by_prefix(&gw, &manager, "ffffffff"),
            Err(Error::OrderNotFound { .. })
        ));
    }

    #[test]
    fn test_member_cancel_is_denied() {
        let gw = memory_gateway();
        let admin = login("u1").unwrap();
        let seeded = gw.request_orders(&admin).unwrap()[0].id;

        let err = gw
            .request_cancel_order(&login("u4").unwrap(), seeded)
            .unwrap_err();
        assert!(err.is_denied());
    }
}
