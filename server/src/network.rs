//! Server network layer handling UDP communications and session coordination

use crate::config::{GameConfig, ServerConfig};
use crate::driver::run_session;
use crate::registry::{GameRegistry, RegistryError};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Action, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

const OUTGOING_QUEUE_CAPACITY: usize = 4096;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    SessionExpired {
        session_id: u32,
        addr: SocketAddr,
    },
    Shutdown,
}

/// Asks a running [`Server`] loop to stop
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Server loop already stopped");
        }
    }
}

/// Messages sent from the server loop and session drivers to the network sender
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Main server coordinating networking and the per-session game loops
pub struct Server {
    socket: Arc<UdpSocket>,
    registry: Arc<RwLock<GameRegistry>>,
    tick_duration: Duration,
    idle_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::Sender<GameMessage>,
    game_rx: Option<mpsc::Receiver<GameMessage>>,
}

impl Server {
    pub async fn new(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let address = config.address();
        let socket = Arc::new(UdpSocket::bind(&address).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::channel(OUTGOING_QUEUE_CAPACITY);
        let game_config: GameConfig = config.game_config();

        Ok(Server {
            socket,
            registry: Arc::new(RwLock::new(GameRegistry::new(
                config.max_games,
                game_config,
            ))),
            tick_duration: config.tick_duration(),
            idle_timeout: config.idle_timeout(),
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn registry(&self) -> Arc<RwLock<GameRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let Some(mut game_rx) = self.game_rx.take() else {
            return;
        };
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that expires idle sessions and reports server load
    fn spawn_session_reaper(&self) {
        let registry = Arc::clone(&self.registry);
        let server_tx = self.server_tx.clone();
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let (expired, games, max_games) = {
                    let mut registry = registry.write().await;
                    let expired = registry.cleanup_inactive(idle_timeout);
                    (expired, registry.len(), registry.max_games())
                };

                debug!("Games: {}/{}", games, max_games);

                for (session_id, addr) in expired {
                    let message = ServerMessage::SessionExpired { session_id, addr };
                    if let Err(e) = server_tx.send(message) {
                        error!("Failed to send expiry message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }).await {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Creates a game for a newly connected client and starts its driving loop
    async fn open_session(&self, addr: SocketAddr) {
        // A reconnect from the same address starts over
        let created = {
            let mut registry = self.registry.write().await;
            if let Some(existing_id) = registry.find_session_by_addr(addr) {
                info!("Replacing session {} for {}", existing_id, addr);
                registry.remove_game(existing_id);
            }
            registry.create_game(addr)
        };

        match created {
            Ok((session_id, game)) => {
                self.send_packet(Packet::Connected { session_id }, addr).await;
                tokio::spawn(run_session(
                    session_id,
                    addr,
                    game,
                    Arc::clone(&self.registry),
                    self.game_tx.clone(),
                    self.tick_duration,
                ));
            }
            Err(e @ RegistryError::MaxGamesReached { .. }) => {
                warn!("Refusing {}: {}", addr, e);
                let reason = e.to_string();
                self.send_packet(Packet::Rejected { reason }, addr).await;
            }
            Err(e) => {
                error!("Failed to create game for {}: {}", addr, e);
                let reason = "Failed to create game".to_string();
                self.send_packet(Packet::Rejected { reason }, addr).await;
            }
        }
    }

    /// Processes incoming packets
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    let reason = "Protocol version mismatch".to_string();
                    self.send_packet(Packet::Rejected { reason }, addr).await;
                    return;
                }

                self.open_session(addr).await;
            }

            Packet::Key { key } => {
                let game = {
                    let mut registry = self.registry.write().await;
                    registry.find_session_by_addr(addr).and_then(|session_id| {
                        registry.touch(session_id);
                        registry.get_game(session_id)
                    })
                };

                let Some(game) = game else {
                    debug!("Key from {} without a game", addr);
                    return;
                };

                match Action::from_key(&key) {
                    Some(action) => game.apply(action),
                    None => debug!("Ignoring unmapped key {:?} from {}", key, addr),
                }
            }

            Packet::Disconnect => {
                let mut registry = self.registry.write().await;
                if let Some(session_id) = registry.find_session_by_addr(addr) {
                    registry.remove_game(session_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_session_reaper();

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::SessionExpired { session_id, addr } => {
                    info!("Session {} timed out", session_id);
                    self.send_packet(Packet::GameTimeout, addr).await;
                }
                ServerMessage::Shutdown => {
                    break;
                }
            }
        }

        info!("Server shutting down");
        Ok(())
    }
}
