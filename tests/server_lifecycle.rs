mod common;

use common::{memory_options, start_server, FtpClient};
use plugftpd::core_auth::PasswdAuth;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_connection_limit_replies_421() {
    let mut options = memory_options();
    options.max_connections = 1;
    let server = start_server(options).await;

    let mut first = FtpClient::connect(server.addr).await;
    let mut second = FtpClient::connect_raw(server.addr).await;
    let (code, _) = second.read_reply().await;
    assert_eq!(code, 421);
    assert!(second.is_closed().await);

    // the slot frees up once the first client leaves
    assert_eq!(first.cmd("QUIT").await.0, 221);
    assert!(first.is_closed().await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut third = FtpClient::connect(server.addr).await;
    assert_eq!(third.cmd("NOOP").await.0, 200);
}

#[tokio::test]
async fn test_shutdown_closes_idle_sessions() {
    let server = start_server(memory_options()).await;
    let mut client = FtpClient::connect(server.addr).await;
    assert_eq!(client.login("admin", "admin").await, 230);

    server.shutdown.shutdown();
    assert!(server.shutdown.is_shutdown());
    let (code, _) = client.read_reply().await;
    assert_eq!(code, 421);
    assert!(client.is_closed().await);

    let served = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("serve did not return after shutdown")
        .unwrap();
    assert!(served.is_ok());
}

#[tokio::test]
async fn test_idle_timeout_closes_connection() {
    let mut options = memory_options();
    options.idle_timeout = Duration::from_millis(200);
    let server = start_server(options).await;
    let mut client = FtpClient::connect(server.addr).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_passwd_file_logins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("passwd");
    let hash = bcrypt::hash("s3cret", 4).unwrap();
    std::fs::write(&path, format!("# users\nalice:{}\n", hash)).unwrap();

    let mut options = memory_options();
    options.auth = Arc::new(PasswdAuth::load(&path).await.unwrap());
    let server = start_server(options).await;

    let mut client = FtpClient::connect(server.addr).await;
    assert_eq!(client.login("alice", "wrong").await, 530);
    assert_eq!(client.login("bob", "s3cret").await, 530);
    assert_eq!(client.login("alice", "s3cret").await, 230);
    assert_eq!(client.cmd("PWD").await.0, 257);
}
