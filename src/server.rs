use crate::config::Config;
use crate::core_auth::Auth;
use crate::core_driver::DriverFactory;
use crate::core_network::network;
use crate::core_network::throttle::Throttle;
use crate::core_notifier::NotifierList;
use crate::core_perm::{Perm, SimplePerm};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Everything a server needs; the pluggable parts are trait objects.
pub struct ServerOptions {
    pub name: String,
    pub listen_addr: SocketAddr,
    /// Address advertised in `227` replies. Defaults to the local address of
    /// the control connection.
    pub pasv_address: Option<IpAddr>,
    pub pasv_ports: Option<(u16, u16)>,
    pub auth: Arc<dyn Auth>,
    pub factory: Arc<dyn DriverFactory>,
    pub perm: Arc<dyn Perm>,
    pub notifiers: NotifierList,
    /// Bytes per second shared by every transfer; `None` is unlimited.
    pub rate_limit: Option<NonZeroU32>,
    pub idle_timeout: Duration,
    pub data_timeout: Duration,
    pub max_connections: usize,
    pub shutdown_grace: Duration,
    pub upload_buffer_size: usize,
    pub download_buffer_size: usize,
}

impl ServerOptions {
    pub fn new(auth: Arc<dyn Auth>, factory: Arc<dyn DriverFactory>) -> Self {
        let defaults = Config::default().server;
        Self {
            name: defaults.server_name,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], defaults.listen_port)),
            pasv_address: None,
            pasv_ports: None,
            auth,
            factory,
            perm: Arc::new(SimplePerm::new("ftp", "ftp")),
            notifiers: NotifierList::default(),
            rate_limit: None,
            idle_timeout: Duration::from_secs(defaults.idle_timeout_secs),
            data_timeout: Duration::from_secs(defaults.data_timeout_secs),
            max_connections: defaults.max_connections,
            shutdown_grace: Duration::from_secs(defaults.shutdown_grace_secs),
            upload_buffer_size: defaults.upload_buffer_size,
            download_buffer_size: defaults.download_buffer_size,
        }
    }

    pub fn from_config(
        config: &Config,
        auth: Arc<dyn Auth>,
        factory: Arc<dyn DriverFactory>,
    ) -> Result<Self> {
        let server = &config.server;
        let listen_ip: IpAddr = server
            .listen_address
            .parse()
            .with_context(|| format!("Invalid listen_address: {}", server.listen_address))?;
        let pasv_address = server
            .pasv_address
            .as_deref()
            .map(|addr| {
                addr.parse::<IpAddr>()
                    .with_context(|| format!("Invalid pasv_address: {}", addr))
            })
            .transpose()?;

        Ok(Self {
            name: server.server_name.clone(),
            listen_addr: SocketAddr::new(listen_ip, server.listen_port),
            pasv_address,
            pasv_ports: server.pasv_port_range,
            perm: Arc::new(SimplePerm::new(&config.perm.owner, &config.perm.group)),
            rate_limit: NonZeroU32::new(server.rate_limit),
            idle_timeout: Duration::from_secs(server.idle_timeout_secs),
            data_timeout: Duration::from_secs(server.data_timeout_secs),
            max_connections: server.max_connections,
            shutdown_grace: Duration::from_secs(server.shutdown_grace_secs),
            upload_buffer_size: server.upload_buffer_size,
            download_buffer_size: server.download_buffer_size,
            ..Self::new(auth, factory)
        })
    }
}

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub peer_addr: SocketAddr,
    pub user: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Live sessions by id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, SessionEntry>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    fn sessions(&self) -> MutexGuard<'_, HashMap<u64, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a new session unless `max` are already live.
    pub fn try_register(&self, peer_addr: SocketAddr, max: usize) -> Option<u64> {
        let mut sessions = self.sessions();
        if sessions.len() >= max {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        sessions.insert(
            id,
            SessionEntry {
                peer_addr,
                user: None,
                connected_at: Utc::now(),
            },
        );
        Some(id)
    }

    pub fn set_user(&self, id: u64, user: Option<String>) {
        if let Some(entry) = self.sessions().get_mut(&id) {
            entry.user = user;
        }
    }

    pub fn remove(&self, id: u64) {
        self.sessions().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    pub fn snapshot(&self) -> Vec<(u64, SessionEntry)> {
        let mut entries: Vec<_> = self
            .sessions()
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

/// Shared, read-mostly state handed to every session.
pub struct ServerState {
    pub options: ServerOptions,
    pub throttle: Throttle,
    pub registry: SessionRegistry,
    pub shutdown: CancellationToken,
}

/// Stops a running server from anywhere.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
    tracker: TaskTracker,
}

impl Server {
    pub async fn bind(options: ServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind(options.listen_addr).await?;
        let throttle = options
            .rate_limit
            .map(Throttle::per_second)
            .unwrap_or_default();
        Ok(Self {
            listener,
            state: Arc::new(ServerState {
                options,
                throttle,
                registry: SessionRegistry::default(),
                shutdown: CancellationToken::new(),
            }),
            tracker: TaskTracker::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            token: self.state.shutdown.clone(),
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Accepts connections until shutdown, then waits for every session to
    /// finish.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self.listener.local_addr()?;
        info!(
            "{} listening on {} (max {} clients)",
            self.state.options.name, addr, self.state.options.max_connections
        );
        if self.state.throttle.is_limited() {
            info!("Transfer rate limited to {} bytes/s", self.state.throttle.rate());
        }

        network::accept_loop(self.listener, Arc::clone(&self.state), self.tracker.clone()).await;

        for (id, entry) in self.state.registry.snapshot() {
            info!(
                "[session {}] Still open at shutdown: {} as {} since {}",
                id,
                entry.peer_addr,
                entry.user.as_deref().unwrap_or("-"),
                entry.connected_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        self.tracker.close();
        info!("Waiting for {} session(s) to finish", self.tracker.len());
        self.tracker.wait().await;
        info!("Server stopped.");
        Ok(())
    }
}
