use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use log::{error, info};
use plugftpd::config::{log_config, StorageKind};
use plugftpd::core_auth::helper::hash_password;
use plugftpd::core_auth::{Auth, PasswdAuth, SimpleAuth};
use plugftpd::core_cli::Cli;
use plugftpd::core_driver::file::FileDriverFactory;
use plugftpd::core_driver::memory::MemoryStore;
use plugftpd::core_driver::object::ObjectDriverFactory;
use plugftpd::core_driver::DriverFactory;
use plugftpd::core_notifier::{LogNotifier, NotifierList};
use plugftpd::{Config, Server, ServerOptions};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    if let Some(password) = &args.hash_password {
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    // Load configuration from the TOML file, or run on defaults
    let mut config = if args.config.is_empty() {
        info!("No configuration file given, using defaults.");
        Config::default()
    } else {
        Config::load_from_file(&args.config)?
    };
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    if let Some(root) = args.root {
        config.storage.root_dir = root;
    }
    log_config(&config);

    let auth: Arc<dyn Auth> = match &config.auth.passwd_file {
        Some(path) => {
            let passwd = PasswdAuth::load(path).await?;
            info!("Loaded {} account(s) from {}", passwd.len(), path.display());
            Arc::new(passwd)
        }
        None => Arc::new(SimpleAuth::new(&config.auth.username, &config.auth.password)),
    };

    let factory: Arc<dyn DriverFactory> = match config.storage.driver {
        StorageKind::File => {
            let root = &config.storage.root_dir;
            std::fs::create_dir_all(root)
                .with_context(|| format!("Failed to create storage root: {}", root.display()))?;
            Arc::new(FileDriverFactory::new(root.clone()))
        }
        StorageKind::Memory => Arc::new(ObjectDriverFactory::new(Arc::new(MemoryStore::new()))),
    };

    let mut options = ServerOptions::from_config(&config, auth, factory)?;
    options.notifiers = NotifierList::new(vec![Arc::new(LogNotifier)]);

    let server = Server::bind(options)
        .await
        .with_context(|| format!("Failed to bind port {}", config.server.listen_port))?;
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down.");
                shutdown.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.serve().await?;
    Ok(())
}
