//! Log in, place a limit order, list open orders, then cancel it.
//!
//! Run: cargo run --example place_order --features native -- buy 10.50 3
//!
//! Reads `VENUE_API_URL`, `VENUE_USERNAME` and `VENUE_PASSWORD` from the
//! environment or a `.env` file.

use std::env;

use tracing_subscriber::EnvFilter;
use venue_sdk::prelude::*;
use venue_sdk::shared::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("venue_sdk=info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let side: Side = args.next().unwrap_or_else(|| "buy".into()).parse()?;
    let price: Decimal = args.next().unwrap_or_else(|| "10.50".into()).parse()?;
    let quantity: u64 = args.next().unwrap_or_else(|| "1".into()).parse()?;
    let order = NewOrder::new(side, price, quantity)?;

    let api_url = env::var("VENUE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let username = env::var("VENUE_USERNAME")?;
    let password = env::var("VENUE_PASSWORD")?;

    let client = VenueClient::builder().base_url(&api_url).build()?;
    if !client.auth().login(&username, &password).await? {
        eprintln!("Login rejected for {username}");
        return Ok(());
    }

    let ack = match client.orders().place(&order).await {
        Ok(ack) => ack,
        Err(SdkError::Http(HttpError::Rejected { status, body })) => {
            eprintln!("Order rejected ({status}): {body}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!(
        "#{} {} {} @ {} [{}]",
        ack.id,
        ack.side,
        ack.quantity,
        fmt::price(&ack.price),
        ack.status
    );

    for open in client.orders().list(0, 20).await?.iter().filter(|o| o.status.is_live()) {
        println!(
            "  open #{} {} {}/{} @ {}",
            open.id,
            open.side,
            open.filled_quantity,
            open.quantity,
            fmt::price(&open.price)
        );
    }

    println!("{}", client.orders().cancel(ack.id).await?);
    client.auth().logout().await;
    Ok(())
}
