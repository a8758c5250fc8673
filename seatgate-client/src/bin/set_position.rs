//! Send one set-position request to a seatgate gateway.
//!
//! Usage: set_position <position> [driver|left|passenger|right] [gateway-addr]

use std::net::SocketAddr;

use seatgate_client::{Seat, SeatClient};

const USAGE: &str = "usage: set_position <position> [driver|left|passenger|right] [gateway-addr]";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    position: i64,
    seat: Seat,
    addr: SocketAddr,
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let position = args
            .next()
            .ok_or_else(|| USAGE.to_string())?
            .parse()
            .map_err(|e| format!("invalid position: {}\n{}", e, USAGE))?;

        let mut seat = Seat::Driver;
        let mut addr = SocketAddr::from(([127, 0, 0, 1], 1883));
        for arg in args {
            // Addresses contain a port; anything else must name a seat
            if let Ok(parsed) = arg.parse::<SocketAddr>() {
                addr = parsed;
            } else {
                seat = arg.parse().map_err(|e| format!("{}\n{}", e, USAGE))?;
            }
        }

        Ok(Self {
            position,
            seat,
            addr,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse(std::env::args().skip(1))?;

    println!("Connecting to seatgate gateway at {}...", args.addr);
    let mut client = SeatClient::connect(args.addr.to_string()).await?;

    let response = client.set_position(args.seat, args.position).await?;
    println!("Response: {}", serde_json::to_string(&response)?);

    // Only mirrored seats report their new position
    if response.is_success() && args.seat.mirror_topic().is_some() {
        let state = client.next_state_update().await?;
        println!("Current position: {}", serde_json::to_string(&state)?);
    }

    Ok(())
}
