use anyhow::{Context, bail};
use shared::order::OrderStatus;
use storefront_store::{Channel, StorefrontState, print_banner, setup_environment};

const USAGE: &str = "usage: storefront-store \
    <init | summary | contacts | stats [days] | advance <orderId> [status]>";

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志) 并加载配置
    let config = setup_environment()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        bail!(USAGE);
    };

    // 2. 打开存储
    let state = StorefrontState::open(&config).context("failed to open store")?;

    match command {
        "init" => {
            print_banner();
            let upgraded = state.initialize()?;
            for key in &upgraded {
                tracing::info!(key = %key, "Upgraded legacy collection");
            }
            print_json(&state.summary()?)?;
        }
        "summary" => print_json(&state.summary()?)?,
        "contacts" => print_json(&state.contacts.find_all()?)?,
        "stats" => {
            let days = match args.get(1) {
                Some(raw) => raw.parse().with_context(|| format!("invalid day count: {raw}"))?,
                None => 7,
            };
            print_json(&serde_json::json!({
                "statistics": state.orders.statistics()?,
                "dailyRevenue": state.orders.daily_revenue(days)?,
            }))?;
        }
        "advance" => {
            let Some(id) = args.get(1) else {
                bail!(USAGE);
            };
            // Without an explicit status, move one step along the main line
            let status: OrderStatus = match args.get(2) {
                Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
                None => {
                    let order = state
                        .orders
                        .find_by_id(id)?
                        .with_context(|| format!("order not found: {id}"))?;
                    order
                        .status
                        .next()
                        .with_context(|| format!("order {id} is already {}", order.status))?
                }
            };

            state.bus.add_event_listener(Channel::Any, |envelope| {
                match serde_json::to_string(envelope) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!(error = %e, "Failed to serialize event"),
                }
            });
            let order = state.orders.update_status(id, status)?;
            tracing::info!(order_id = %order.id, status = %order.status, "Order advanced");
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }

    Ok(())
}
