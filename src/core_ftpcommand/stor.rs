use crate::context::Context;
use crate::core_driver::{base_name, DriverError};
use crate::core_network::error::TransferError;
use crate::core_network::transfer::{receive_stream, upload_channel};
use crate::core_notifier::hook_error;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::{info, warn};

/// Handles the STOR FTP command: creates or truncates the file, or resumes
/// at the pending `REST` offset.
pub async fn handle_stor_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let offset = session.restart_offset.take();
    store(session, arg, offset, false).await
}

/// Handles the APPE FTP command: writes at the current end of the file, or
/// creates it.
pub async fn handle_appe_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    session.restart_offset = None;
    store(session, arg, None, true).await
}

async fn store(
    session: &mut Session,
    arg: String,
    offset: Option<u64>,
    append: bool,
) -> Result<(), std::io::Error> {
    let path = session.resolve(&arg);
    let ctx = session.context();
    let notifiers = session.notifiers();

    notifiers.before_put_file(&ctx, &path);
    let result = upload(session, &ctx, &path, offset, append).await?;
    let size = *result.as_ref().unwrap_or(&0);
    notifiers.after_file_put(&ctx, &path, size, hook_error(&result));

    match result {
        Ok(written) => {
            info!("[session {}] Stored {} ({} bytes)", session.id, path, written);
            send_response(&mut session.writer, b"226 Transfer complete.\r\n").await
        }
        Err(e) => {
            warn!("[session {}] Upload of {} failed: {}", session.id, path, e);
            send_line(&mut session.writer, &e.to_ftp_response()).await
        }
    }
}

/// The outer `Result` is the control connection, the inner one the transfer.
async fn upload(
    session: &mut Session,
    ctx: &Context,
    path: &str,
    offset: Option<u64>,
    append: bool,
) -> Result<Result<u64, TransferError>, std::io::Error> {
    let conn = match session.take_data_connection() {
        Ok(conn) => conn,
        Err(e) => return Ok(Err(e.into())),
    };
    let offset = if append {
        match append_offset(session, ctx, path).await {
            Ok(offset) => offset,
            Err(e) => return Ok(Err(e)),
        }
    } else {
        offset
    };

    let line = format!(
        "150 Opening {} mode data connection for {}.",
        session.transfer_type.label(),
        base_name(path)
    );
    send_line(&mut session.writer, &line).await?;

    let opts = session.transfer_opts(true);
    let mut stream = match session.open_data_stream(conn).await {
        Ok(stream) => stream,
        Err(e) => return Ok(Err(e)),
    };
    let driver = match session.driver() {
        Ok(driver) => driver,
        Err(e) => return Ok(Err(e.into())),
    };

    let (tx, reader) = upload_channel();
    let pump = receive_stream(&mut stream, tx, &opts);
    let put = async move {
        // the reader is dropped as soon as the driver returns, which stops the pump
        let mut reader = reader;
        driver.put_file(ctx, path, &mut reader, offset).await
    };
    let (received, stored) = tokio::join!(pump, put);

    if opts.cancel.is_cancelled() {
        return Ok(Err(TransferError::Aborted));
    }
    Ok(match (received, stored) {
        (_, Ok(written)) => Ok(written),
        (Err(e @ TransferError::Io(_)), Err(_)) => Err(e),
        (_, Err(e)) => Err(e.into()),
    })
}

/// Current size of an existing file, or `None` to create it.
async fn append_offset(
    session: &Session,
    ctx: &Context,
    path: &str,
) -> Result<Option<u64>, TransferError> {
    let driver = session.driver()?;
    match driver.stat(ctx, path).await {
        Ok(info) if info.is_dir => Err(DriverError::IsADirectory(path.to_string()).into()),
        Ok(info) => Ok(Some(info.size)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}
