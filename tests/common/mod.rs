#![allow(dead_code)]

use plugftpd::context::Context;
use plugftpd::core_auth::SimpleAuth;
use plugftpd::core_driver::memory::MemoryStore;
use plugftpd::core_driver::object::ObjectDriverFactory;
use plugftpd::core_driver::DriverFactory;
use plugftpd::core_notifier::{HookError, Notifier, NotifierList};
use plugftpd::{Server, ServerOptions, ShutdownHandle};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Records hook names in call order, e.g. `BeforePutFile /a.txt`.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

fn outcome(err: HookError<'_>) -> &'static str {
    if err.is_some() {
        "err"
    } else {
        "ok"
    }
}

impl Notifier for RecordingNotifier {
    fn before_login_user(&self, _ctx: &Context, user: &str) {
        self.push(format!("BeforeLoginUser {}", user));
    }
    fn before_put_file(&self, _ctx: &Context, path: &str) {
        self.push(format!("BeforePutFile {}", path));
    }
    fn before_delete_file(&self, _ctx: &Context, path: &str) {
        self.push(format!("BeforeDeleteFile {}", path));
    }
    fn before_change_cur_dir(&self, _ctx: &Context, old_dir: &str, new_dir: &str) {
        self.push(format!("BeforeChangeCurDir {} {}", old_dir, new_dir));
    }
    fn before_create_dir(&self, _ctx: &Context, path: &str) {
        self.push(format!("BeforeCreateDir {}", path));
    }
    fn before_delete_dir(&self, _ctx: &Context, path: &str) {
        self.push(format!("BeforeDeleteDir {}", path));
    }
    fn before_download_file(&self, _ctx: &Context, path: &str) {
        self.push(format!("BeforeDownloadFile {}", path));
    }
    fn after_user_login(&self, _ctx: &Context, user: &str, pass_matched: bool, err: HookError<'_>) {
        self.push(format!("AfterUserLogin {} {} {}", user, pass_matched, outcome(err)));
    }
    fn after_file_put(&self, _ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
        self.push(format!("AfterFilePut {} {} {}", path, size, outcome(err)));
    }
    fn after_file_deleted(&self, _ctx: &Context, path: &str, err: HookError<'_>) {
        self.push(format!("AfterFileDeleted {} {}", path, outcome(err)));
    }
    fn after_cur_dir_changed(&self, _ctx: &Context, old_dir: &str, new_dir: &str, err: HookError<'_>) {
        self.push(format!("AfterCurDirChanged {} {} {}", old_dir, new_dir, outcome(err)));
    }
    fn after_dir_created(&self, _ctx: &Context, path: &str, err: HookError<'_>) {
        self.push(format!("AfterDirCreated {} {}", path, outcome(err)));
    }
    fn after_dir_deleted(&self, _ctx: &Context, path: &str, err: HookError<'_>) {
        self.push(format!("AfterDirDeleted {} {}", path, outcome(err)));
    }
    fn after_file_downloaded(&self, _ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
        self.push(format!("AfterFileDownloaded {} {} {}", path, size, outcome(err)));
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: ShutdownHandle,
    pub notifier: RecordingNotifier,
    pub handle: JoinHandle<std::io::Result<()>>,
}

/// Options for a server on 127.0.0.1:0 with admin/admin over an in-memory
/// object store.
pub fn memory_options() -> ServerOptions {
    let factory: Arc<dyn DriverFactory> =
        Arc::new(ObjectDriverFactory::new(Arc::new(MemoryStore::new())));
    let mut options = ServerOptions::new(Arc::new(SimpleAuth::new("admin", "admin")), factory);
    options.listen_addr = SocketAddr::from(([127, 0, 0, 1], 0));
    options.data_timeout = Duration::from_secs(5);
    options
}

pub async fn start_server(options: ServerOptions) -> TestServer {
    start_server_recording(options, RecordingNotifier::default()).await
}

/// Like [`start_server`], recording hooks into `notifier`'s log.
pub async fn start_server_recording(
    mut options: ServerOptions,
    notifier: RecordingNotifier,
) -> TestServer {
    options.notifiers = NotifierList::new(vec![Arc::new(notifier.clone())]);
    let server = Server::bind(options).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let handle = tokio::spawn(server.serve());
    TestServer {
        addr,
        shutdown,
        notifier,
        handle,
    }
}

pub struct FtpClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FtpClient {
    /// Connects without reading the greeting.
    pub async fn connect_raw(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn connect(addr: SocketAddr) -> Self {
        let mut client = Self::connect_raw(addr).await;
        let (code, _) = client.read_reply().await;
        assert_eq!(code, 220);
        client
    }

    /// Reads one reply, following `ddd-` continuation lines. Returns the code
    /// and the full text of the last line.
    pub async fn read_reply(&mut self) -> (u16, String) {
        tokio::time::timeout(REPLY_TIMEOUT, self.read_reply_inner())
            .await
            .expect("timed out waiting for a reply")
    }

    async fn read_reply_inner(&mut self) -> (u16, String) {
        let first = self.read_line().await;
        let code: u16 = first[..3].parse().unwrap();
        let mut last = first.clone();
        if first.as_bytes()[3] == b'-' {
            let end = format!("{} ", code);
            while !last.starts_with(&end) {
                last = self.read_line().await;
            }
        }
        (code, last)
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        assert!(n > 0, "control connection closed");
        line.trim_end().to_string()
    }

    /// Whether the server closed the control connection.
    pub async fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        matches!(
            tokio::time::timeout(REPLY_TIMEOUT, self.reader.read_line(&mut line)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    pub async fn cmd(&mut self, line: &str) -> (u16, String) {
        self.send(line).await;
        self.read_reply().await
    }

    pub async fn login(&mut self, user: &str, pass: &str) -> u16 {
        assert_eq!(self.cmd(&format!("USER {}", user)).await.0, 331);
        self.cmd(&format!("PASS {}", pass)).await.0
    }

    /// Sends PASV and returns the advertised data address.
    pub async fn pasv(&mut self) -> SocketAddr {
        let (code, text) = self.cmd("PASV").await;
        assert_eq!(code, 227, "{}", text);
        parse_pasv(&text)
    }

    /// Opens a passive data connection ready for the next transfer command.
    pub async fn open_data(&mut self) -> TcpStream {
        let addr = self.pasv().await;
        TcpStream::connect(addr).await.unwrap()
    }

    /// Downloads `path`; `Err` carries the failing reply.
    pub async fn retr(&mut self, path: &str) -> Result<Vec<u8>, (u16, String)> {
        let mut data = self.open_data().await;
        let reply = self.cmd(&format!("RETR {}", path)).await;
        if reply.0 != 150 {
            return Err(reply);
        }
        let mut buf = Vec::new();
        data.read_to_end(&mut buf).await.unwrap();
        let done = self.read_reply().await;
        if done.0 != 226 {
            return Err(done);
        }
        Ok(buf)
    }

    /// Uploads with `verb` (`STOR` or `APPE`); returns the final reply.
    pub async fn upload(&mut self, verb: &str, path: &str, content: &[u8]) -> (u16, String) {
        let mut data = self.open_data().await;
        let reply = self.cmd(&format!("{} {}", verb, path)).await;
        if reply.0 != 150 {
            return reply;
        }
        data.write_all(content).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        self.read_reply().await
    }

    pub async fn stor(&mut self, path: &str, content: &[u8]) -> (u16, String) {
        self.upload("STOR", path, content).await
    }

    /// Runs LIST or NLST and returns the listing text.
    pub async fn listing(&mut self, command: &str) -> String {
        let mut data = self.open_data().await;
        let (code, text) = self.cmd(command).await;
        assert_eq!(code, 150, "{}", text);
        let mut buf = String::new();
        data.read_to_string(&mut buf).await.unwrap();
        assert_eq!(self.read_reply().await.0, 226);
        buf
    }
}

pub fn parse_pasv(text: &str) -> SocketAddr {
    let start = text.find('(').unwrap() + 1;
    let end = text.find(')').unwrap();
    let nums: Vec<u16> = text[start..end]
        .split(',')
        .map(|n| n.trim().parse().unwrap())
        .collect();
    let ip = std::net::Ipv4Addr::new(nums[0] as u8, nums[1] as u8, nums[2] as u8, nums[3] as u8);
    SocketAddr::from((ip, nums[4] * 256 + nums[5]))
}
