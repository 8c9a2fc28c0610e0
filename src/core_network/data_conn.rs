use crate::core_network::error::DataConnError;
use log::{debug, warn};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Pending data channel negotiated by `PASV`/`EPSV` or `PORT`/`EPRT`.
///
/// Consumed by exactly one transfer. Dropping a passive connection aborts its
/// accept task, which closes the listener.
pub enum DataConnection {
    Passive {
        addr: SocketAddr,
        stream: oneshot::Receiver<io::Result<TcpStream>>,
        accept_task: JoinHandle<()>,
    },
    Active {
        addr: SocketAddr,
    },
}

impl DataConnection {
    /// Starts accepting on `listener` in the background. The client has
    /// `accept_timeout` to connect.
    pub fn passive(listener: TcpListener, accept_timeout: Duration) -> io::Result<Self> {
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();
        let accept_task = tokio::spawn(async move {
            let accepted = match timeout(accept_timeout, listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    debug!("Data connection on {} accepted from {}", addr, peer);
                    Ok(stream)
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "no data connection within the timeout",
                )),
            };
            let _ = tx.send(accepted);
        });
        Ok(DataConnection::Passive {
            addr,
            stream: rx,
            accept_task,
        })
    }

    pub fn active(addr: SocketAddr) -> Self {
        DataConnection::Active { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        match self {
            DataConnection::Passive { addr, .. } | DataConnection::Active { addr } => *addr,
        }
    }

    /// Waits for (passive) or dials (active) the data socket.
    pub async fn open(
        mut self,
        dial_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TcpStream, DataConnError> {
        let connecting = async {
            match &mut self {
                DataConnection::Passive { stream, .. } => match stream.await {
                    Ok(Ok(stream)) => Ok(stream),
                    Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => {
                        Err(DataConnError::AcceptTimeout)
                    }
                    Ok(Err(e)) => Err(DataConnError::Accept(e)),
                    Err(_) => Err(DataConnError::Accept(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "accept task ended without a result",
                    ))),
                },
                DataConnection::Active { addr } => {
                    let addr = *addr;
                    match timeout(dial_timeout, TcpStream::connect(addr)).await {
                        Ok(Ok(stream)) => Ok(stream),
                        Ok(Err(source)) => Err(DataConnError::Dial { addr, source }),
                        Err(_) => Err(DataConnError::DialTimeout(addr)),
                    }
                }
            }
        };

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DataConnError::Cancelled),
            opened = connecting => opened,
        };
        if let Err(e) = &opened {
            warn!("Data connection failed: {}", e);
        }
        opened
    }
}

impl Drop for DataConnection {
    fn drop(&mut self) {
        if let DataConnection::Passive { accept_task, .. } = self {
            accept_task.abort();
        }
    }
}
