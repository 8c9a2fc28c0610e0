use crate::helpers::send_response;
use crate::server::ServerState;
use crate::session::Session;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::task::TaskTracker;

/// Accepts control connections until the server is shut down. Each session
/// runs on its own task; the loop never waits on one.
pub async fn accept_loop(listener: TcpListener, state: Arc<ServerState>, tracker: TaskTracker) {
    loop {
        let accepted = tokio::select! {
            _ = state.shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((socket, addr)) => {
                tracker.spawn(handle_connection(socket, addr, Arc::clone(&state)));
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                // EMFILE and friends; back off briefly
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
    info!("Stopped accepting connections.");
}

pub async fn handle_connection(mut socket: TcpStream, addr: SocketAddr, state: Arc<ServerState>) {
    let max = state.options.max_connections;
    let Some(id) = state.registry.try_register(addr, max) else {
        warn!("Refusing {}: {} connections already open", addr, max);
        let _ = send_response(&mut socket, b"421 Too many connections. Try again later.\r\n").await;
        return;
    };

    let local_addr = match socket.local_addr() {
        Ok(local_addr) => local_addr,
        Err(e) => {
            error!("[session {}] Cannot read local address: {}", id, e);
            state.registry.remove(id);
            return;
        }
    };
    let _ = socket.set_nodelay(true);
    info!("[session {}] New connection from {}", id, addr);

    let (reader, writer) = socket.into_split();
    let session = Session::new(id, addr, local_addr, Box::new(writer), Arc::clone(&state));
    if let Err(e) = session.run(reader).await {
        debug!("[session {}] Connection error: {}", id, e);
    }

    state.registry.remove(id);
    info!("[session {}] Connection closed for {}", id, addr);
}
