//! Scripted client that connects to a server and steers toward the fruit.
//! Handy for watching a session from a terminal without a browser.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{info, warn};
use shared::{Direction, Packet, Snapshot, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::timeout;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:3223")]
    server: SocketAddr,

    /// How long to play, in seconds
    #[arg(short, long, default_value = "30")]
    duration: u64,

    /// Print every n-th frame as text (0 disables)
    #[arg(short, long, default_value = "10")]
    print_every: u64,
}

fn key_for(direction: Direction) -> Option<&'static str> {
    match direction {
        Direction::Up => Some("ArrowUp"),
        Direction::Right => Some("ArrowRight"),
        Direction::Down => Some("ArrowDown"),
        Direction::Left => Some("ArrowLeft"),
        Direction::None => None,
    }
}

/// Greedy heading toward the fruit that never reverses into the tail.
fn choose_direction(snapshot: &Snapshot) -> Direction {
    let player = &snapshot.player;
    let fruit = &snapshot.fruit;

    let reverse = match player.direction {
        Direction::Up => Direction::Down,
        Direction::Down => Direction::Up,
        Direction::Left => Direction::Right,
        Direction::Right => Direction::Left,
        Direction::None => Direction::None,
    };

    let mut wanted = Vec::with_capacity(2);
    if fruit.active {
        if fruit.x > player.x {
            wanted.push(Direction::Right);
        } else if fruit.x < player.x {
            wanted.push(Direction::Left);
        }
        if fruit.y > player.y {
            wanted.push(Direction::Down);
        } else if fruit.y < player.y {
            wanted.push(Direction::Up);
        }
    }

    wanted
        .into_iter()
        .find(|&d| d != reverse || player.tail.is_empty())
        .unwrap_or(player.direction)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Client socket bound to {}", socket.local_addr()?);

    socket
        .send_to(
            &serialize(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })?,
            args.server,
        )
        .await?;

    let mut buf = vec![0u8; 65536];
    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut frames = 0u64;
    let mut last_key = None;

    while Instant::now() < deadline {
        let (len, _) = match timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("No data from server for 2s");
                continue;
            }
        };

        match deserialize::<Packet>(&buf[..len]) {
            Ok(Packet::Connected { session_id }) => info!("Playing as session {}", session_id),
            Ok(Packet::Frame(snapshot)) => {
                frames += 1;
                if args.print_every > 0 && frames % args.print_every == 0 {
                    println!(
                        "score {}  elapsed {:.1}s\n{}",
                        snapshot.score,
                        snapshot.elapsed_ms as f64 / 1000.0,
                        snapshot.to_ascii()
                    );
                }

                if let Some(key) = key_for(choose_direction(&snapshot)) {
                    if last_key != Some(key) || snapshot.player.direction == Direction::None {
                        let packet = Packet::Key {
                            key: key.to_string(),
                        };
                        socket.send_to(&serialize(&packet)?, args.server).await?;
                        last_key = Some(key);
                    }
                }
            }
            Ok(Packet::Rejected { reason }) => {
                warn!("Rejected by server: {}", reason);
                return Ok(());
            }
            Ok(Packet::GameTimeout) => {
                info!("Game timed out");
                return Ok(());
            }
            Ok(other) => warn!("Unexpected packet: {:?}", other),
            Err(e) => warn!("Failed to deserialize packet: {}", e),
        }
    }

    socket
        .send_to(&serialize(&Packet::Disconnect)?, args.server)
        .await?;
    info!("Done after {} frames", frames);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{FruitSnapshot, PlayerSnapshot};

    fn snapshot(player: (i32, i32), direction: Direction, fruit: (i32, i32)) -> Snapshot {
        Snapshot {
            rows: 10,
            cols: 10,
            player: PlayerSnapshot {
                x: player.0,
                y: player.1,
                direction,
                tail: vec![(player.0 - 1, player.1)],
            },
            fruit: FruitSnapshot {
                active: true,
                x: fruit.0,
                y: fruit.1,
            },
            score: 0,
            is_paused: false,
            show_help: false,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_heads_toward_fruit() {
        assert_eq!(
            choose_direction(&snapshot((2, 2), Direction::Right, (5, 2))),
            Direction::Right
        );
        assert_eq!(
            choose_direction(&snapshot((2, 2), Direction::Right, (2, 6))),
            Direction::Down
        );
    }

    #[test]
    fn test_never_reverses_with_tail() {
        assert_eq!(
            choose_direction(&snapshot((5, 2), Direction::Right, (1, 2))),
            Direction::Right
        );
    }

    #[test]
    fn test_key_mapping_round_trips() {
        for direction in [Direction::Up, Direction::Right, Direction::Down, Direction::Left] {
            let key = key_for(direction).unwrap();
            assert_eq!(
                shared::Action::from_key(key),
                Some(shared::Action::Move(direction))
            );
        }
        assert_eq!(key_for(Direction::None), None);
    }
}
