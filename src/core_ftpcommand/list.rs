use crate::core_ftpcommand::utils::{collect_entries, format_list_line, strip_list_options};
use crate::core_network::error::TransferError;
use crate::core_network::transfer::send_stream;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use chrono::Utc;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListFormat {
    Long,
    NamesOnly,
}

pub async fn handle_list_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    send_listing(session, &arg, ListFormat::Long).await
}

pub async fn handle_nlst_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    send_listing(session, &arg, ListFormat::NamesOnly).await
}

async fn send_listing(
    session: &mut Session,
    arg: &str,
    format: ListFormat,
) -> Result<(), std::io::Error> {
    let path = session.resolve(strip_list_options(arg));
    let ctx = session.context();

    let conn = match session.take_data_connection() {
        Ok(conn) => conn,
        Err(e) => return send_line(&mut session.writer, e.to_ftp_response()).await,
    };
    let perm = session.state.options.perm.clone();
    let entries = match session.driver() {
        Ok(driver) => collect_entries(driver, perm.as_ref(), &ctx, &path).await,
        Err(e) => Err(e),
    };
    let entries = match entries {
        Ok(entries) => entries,
        Err(e) => return send_line(&mut session.writer, &e.to_ftp_response()).await,
    };

    let now = Utc::now();
    let listing: String = entries
        .iter()
        .map(|entry| match format {
            ListFormat::Long => format_list_line(entry, now),
            ListFormat::NamesOnly => format!("{}\r\n", entry.name),
        })
        .collect();
    debug!("[session {}] Listing {} ({} entries)", session.id, path, entries.len());

    send_response(
        &mut session.writer,
        b"150 Opening ASCII mode data connection for file list.\r\n",
    )
    .await?;

    let mut opts = session.transfer_opts(false);
    opts.ascii = false;
    let result: Result<u64, TransferError> = match session.open_data_stream(conn).await {
        Ok(mut stream) => send_stream(&mut listing.as_bytes(), &mut stream, &opts).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => send_response(&mut session.writer, b"226 Transfer complete.\r\n").await,
        Err(e) => send_line(&mut session.writer, &e.to_ftp_response()).await,
    }
}
