use crate::helpers::send_response;
use crate::session::Session;

/// Remembers the rename source; nothing is touched until `RNTO`.
pub async fn handle_rnfr_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    session.rename_from = Some(session.resolve(&arg));
    send_response(
        &mut session.writer,
        b"350 Requested file action pending further information.\r\n",
    )
    .await
}
