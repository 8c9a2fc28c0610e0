use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// Per-command view of a session handed to drivers, authenticators and notifiers.
///
/// It is rebuilt from the session before every hooked operation, so `cur_dir`
/// reflects the directory at the time the command started.
#[derive(Debug, Clone)]
pub struct Context {
    pub session_id: u64,
    pub peer_addr: SocketAddr,
    pub user: Option<String>,
    pub cur_dir: String,
    /// Cancelled when the current command is aborted or the server shuts down.
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(session_id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            session_id,
            peer_addr,
            user: None,
            cur_dir: String::from("/"),
            cancel: CancellationToken::new(),
        }
    }

    pub fn user_or_anonymous(&self) -> &str {
        self.user.as_deref().unwrap_or("-")
    }
}
