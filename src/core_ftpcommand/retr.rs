use crate::context::Context;
use crate::core_driver::base_name;
use crate::core_network::error::TransferError;
use crate::core_network::transfer::send_stream;
use crate::core_notifier::hook_error;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::{info, warn};

/// Handles the RETR (Retrieve) FTP command.
///
/// Sends the file from the pending `REST` offset (0 if none) over the data
/// connection. The offset is consumed whether or not the transfer succeeds.
pub async fn handle_retr_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let offset = session.restart_offset.take().unwrap_or(0);
    let path = session.resolve(&arg);
    let ctx = session.context();
    let notifiers = session.notifiers();

    notifiers.before_download_file(&ctx, &path);
    let result = download(session, &ctx, &path, offset).await?;
    let size = *result.as_ref().unwrap_or(&0);
    notifiers.after_file_downloaded(&ctx, &path, size, hook_error(&result));

    match result {
        Ok(sent) => {
            info!(
                "[session {}] Sent {} ({} bytes from offset {})",
                session.id, path, sent, offset
            );
            send_response(&mut session.writer, b"226 Transfer complete.\r\n").await
        }
        Err(e) => {
            warn!("[session {}] RETR {} failed: {}", session.id, path, e);
            send_line(&mut session.writer, &e.to_ftp_response()).await
        }
    }
}

/// The outer `Result` is the control connection, the inner one the transfer.
async fn download(
    session: &mut Session,
    ctx: &Context,
    path: &str,
    offset: u64,
) -> Result<Result<u64, TransferError>, std::io::Error> {
    let conn = match session.take_data_connection() {
        Ok(conn) => conn,
        Err(e) => return Ok(Err(e.into())),
    };
    let opened = match session.driver() {
        Ok(driver) => driver.get_file(ctx, path, offset).await,
        Err(e) => Err(e),
    };
    let (remaining, mut reader) = match opened {
        Ok(opened) => opened,
        Err(e) => return Ok(Err(e.into())),
    };

    let line = format!(
        "150 Opening {} mode data connection for {} ({} bytes).",
        session.transfer_type.label(),
        base_name(path),
        remaining
    );
    send_line(&mut session.writer, &line).await?;

    let opts = session.transfer_opts(false);
    let mut stream = match session.open_data_stream(conn).await {
        Ok(stream) => stream,
        Err(e) => return Ok(Err(e)),
    };
    Ok(send_stream(&mut reader, &mut stream, &opts).await)
}
