use crate::context::Context;
use crate::core_driver::{Driver, DriverError};
use crate::core_ftpcommand::ftpcommand::is_abort_line;
use crate::core_ftpcommand::handlers::dispatch;
use crate::core_network::data_conn::DataConnection;
use crate::core_network::error::{DataConnError, TransferError};
use crate::core_network::transfer::TransferOpts;
use crate::core_notifier::NotifierList;
use crate::helpers::{normalize_path, send_line, send_response};
use crate::server::ServerState;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Longest command line accepted from a client, CRLF included.
const MAX_COMMAND_LINE: u64 = 4096;

/// Lines a client may send ahead while a command is still running.
const MAX_QUEUED_LINES: usize = 16;

/// What the control reader hands to the command loop.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ControlLine {
    Command(String),
    /// Longer than `MAX_COMMAND_LINE`; the whole line was discarded.
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    UserNamed(String),
    Authenticated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl TransferType {
    pub fn label(&self) -> &'static str {
        match self {
            TransferType::Ascii => "ASCII",
            TransferType::Binary => "BINARY",
        }
    }
}

/// State of one control connection. Owned and mutated only by its task.
pub struct Session {
    pub id: u64,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub(crate) writer: Box<dyn AsyncWrite + Send + Sync + Unpin>,
    pub auth_state: AuthState,
    pub current_dir: String,
    pub transfer_type: TransferType,
    pub rename_from: Option<String>,
    pub restart_offset: Option<u64>,
    pub data_conn: Option<DataConnection>,
    pub driver: Option<Box<dyn Driver>>,
    /// Token of the command currently running.
    pub cancel: CancellationToken,
    pub state: Arc<ServerState>,
    pub quit: bool,
}

impl Session {
    pub fn new(
        id: u64,
        peer_addr: SocketAddr,
        local_addr: SocketAddr,
        writer: Box<dyn AsyncWrite + Send + Sync + Unpin>,
        state: Arc<ServerState>,
    ) -> Self {
        Self {
            id,
            peer_addr,
            local_addr,
            writer,
            auth_state: AuthState::Unauthenticated,
            current_dir: String::from("/"),
            transfer_type: TransferType::Ascii,
            rename_from: None,
            restart_offset: None,
            data_conn: None,
            driver: None,
            cancel: CancellationToken::new(),
            state,
            quit: false,
        }
    }

    pub fn user(&self) -> Option<&str> {
        match &self.auth_state {
            AuthState::Unauthenticated => None,
            AuthState::UserNamed(user) | AuthState::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth_state, AuthState::Authenticated(_))
    }

    pub fn context(&self) -> Context {
        Context {
            session_id: self.id,
            peer_addr: self.peer_addr,
            user: self.user().map(str::to_string),
            cur_dir: self.current_dir.clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn resolve(&self, arg: &str) -> String {
        normalize_path(&self.current_dir, arg)
    }

    pub fn notifiers(&self) -> NotifierList {
        self.state.options.notifiers.clone()
    }

    pub fn driver(&self) -> Result<&dyn Driver, DriverError> {
        self.driver
            .as_deref()
            .ok_or_else(|| DriverError::Unavailable("no storage driver for this session".to_string()))
    }

    pub fn take_data_connection(&mut self) -> Result<DataConnection, DataConnError> {
        self.data_conn.take().ok_or(DataConnError::NotNegotiated)
    }

    /// Waits for or dials the data socket of a transfer.
    pub async fn open_data_stream(
        &self,
        conn: DataConnection,
    ) -> Result<TcpStream, TransferError> {
        match conn.open(self.state.options.data_timeout, &self.cancel).await {
            Ok(stream) => Ok(stream),
            Err(DataConnError::Cancelled) => Err(TransferError::Aborted),
            Err(e) => Err(e.into()),
        }
    }

    pub fn transfer_opts(&self, upload: bool) -> TransferOpts {
        let options = &self.state.options;
        TransferOpts {
            throttle: self.state.throttle.clone(),
            cancel: self.cancel.clone(),
            buffer_size: if upload {
                options.upload_buffer_size
            } else {
                options.download_buffer_size
            },
            ascii: self.transfer_type == TransferType::Ascii,
        }
    }

    /// Greets the client and serves commands until QUIT, disconnect, idle
    /// timeout or server shutdown.
    pub async fn run<R>(mut self, reader: R) -> io::Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (line_tx, mut lines) = mpsc::channel(MAX_QUEUED_LINES);
        let reader_task = tokio::spawn(read_control_lines(reader, line_tx, self.id));
        let result = self.command_loop(&mut lines).await;
        reader_task.abort();
        self.data_conn = None;
        let _ = self.writer.shutdown().await;
        result
    }

    async fn command_loop(&mut self, lines: &mut mpsc::Receiver<ControlLine>) -> io::Result<()> {
        let banner = format!("220 {} ready.", self.state.options.name);
        send_line(&mut self.writer, &banner).await?;

        let shutdown = self.state.shutdown.clone();
        let idle_timeout = self.state.options.idle_timeout;
        let mut queued = VecDeque::new();
        let mut control_open = true;

        while !self.quit {
            if shutdown.is_cancelled() {
                return self.reply_shutdown().await;
            }
            let line = match queued.pop_front() {
                Some(line) => line,
                None if !control_open => break,
                None => {
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => return self.reply_shutdown().await,
                        next = timeout(idle_timeout, lines.recv()) => match next {
                            Ok(Some(line)) => line,
                            Ok(None) => {
                                debug!("[session {}] Client {} disconnected", self.id, self.peer_addr);
                                break;
                            }
                            Err(_) => {
                                info!(
                                    "[session {}] Closing idle connection from {}",
                                    self.id, self.peer_addr
                                );
                                break;
                            }
                        },
                    }
                }
            };
            let line = match line {
                ControlLine::Command(line) => line,
                ControlLine::TooLong => {
                    warn!("[session {}] Discarded an over-long command line", self.id);
                    send_response(&mut self.writer, b"500 Command line too long.\r\n").await?;
                    continue;
                }
            };
            control_open = self
                .run_command(line, lines, &mut queued, control_open)
                .await?;
        }
        Ok(())
    }

    /// Runs one command while still reading the control channel: `ABOR`
    /// cancels the command, other lines wait in `queued`. A client that
    /// overfills `queued` has its command cancelled and gets 421. Returns
    /// whether the control channel is still open.
    async fn run_command(
        &mut self,
        line: String,
        lines: &mut mpsc::Receiver<ControlLine>,
        queued: &mut VecDeque<ControlLine>,
        mut control_open: bool,
    ) -> io::Result<bool> {
        let cancel = CancellationToken::new();
        self.cancel = cancel.clone();
        let shutdown = self.state.shutdown.clone();
        let grace = self.state.options.shutdown_grace;
        let session_id = self.id;
        let mut aborted = false;
        let mut flooded = false;

        let result = {
            let grace_expired = async {
                shutdown.cancelled().await;
                tokio::time::sleep(grace).await;
            };
            tokio::pin!(grace_expired);
            let command = dispatch(self, line);
            tokio::pin!(command);

            loop {
                tokio::select! {
                    result = &mut command => break result,
                    next = lines.recv(), if control_open => match next {
                        Some(ControlLine::Command(next)) if is_abort_line(&next) => {
                            debug!("[session {}] ABOR received during command", session_id);
                            cancel.cancel();
                            aborted = true;
                        }
                        Some(next) if queued.len() < MAX_QUEUED_LINES => queued.push_back(next),
                        Some(_) => {
                            warn!("[session {}] Too many commands queued, closing", session_id);
                            flooded = true;
                            control_open = false;
                            cancel.cancel();
                        }
                        None => {
                            control_open = false;
                            cancel.cancel();
                        }
                    },
                    _ = &mut grace_expired, if !cancel.is_cancelled() => {
                        warn!("[session {}] Shutdown grace expired, cancelling command", session_id);
                        cancel.cancel();
                    }
                }
            }
        };
        result?;

        if flooded {
            queued.clear();
            self.quit = true;
            send_response(
                &mut self.writer,
                b"421 Too many commands pending, closing control connection.\r\n",
            )
            .await?;
            return Ok(false);
        }
        if aborted && control_open {
            send_response(&mut self.writer, b"226 ABOR command successful.\r\n").await?;
        }
        Ok(control_open)
    }

    async fn reply_shutdown(&mut self) -> io::Result<()> {
        info!("[session {}] Server shutting down, closing {}", self.id, self.peer_addr);
        send_response(
            &mut self.writer,
            b"421 Service not available, closing control connection.\r\n",
        )
        .await
    }
}

/// Feeds complete command lines, CRLF stripped, into `tx` until EOF. A line
/// over `MAX_COMMAND_LINE` is skipped up to its `\n` and reported once as
/// `TooLong`; no part of it is passed on as a command.
async fn read_control_lines<R>(reader: R, tx: mpsc::Sender<ControlLine>, session_id: u64)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        let line = match read_limited_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!("[session {}] Control connection read failed: {}", session_id, e);
                break;
            }
        };
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

/// Reads one control line. `None` at EOF.
async fn read_limited_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<ControlLine>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader).take(MAX_COMMAND_LINE).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") || (n as u64) < MAX_COMMAND_LINE {
        let line = String::from_utf8_lossy(buf)
            .trim_end_matches(&['\r', '\n'][..])
            .to_string();
        return Ok(Some(ControlLine::Command(line)));
    }

    // limit hit mid-line: drop everything up to and including the next \n
    loop {
        buf.clear();
        let n = (&mut *reader).take(MAX_COMMAND_LINE).read_until(b'\n', buf).await?;
        if n == 0 || buf.ends_with(b"\n") {
            return Ok(Some(ControlLine::TooLong));
        }
    }
}
