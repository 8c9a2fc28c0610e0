use crate::helpers::send_response;
use crate::session::Session;

/// ABOR with nothing running. An ABOR that arrives during a transfer never
/// gets here: the session loop cancels the transfer directly.
pub async fn handle_abor_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    session.data_conn = None;
    send_response(&mut session.writer, b"225 No transfer in progress.\r\n").await
}
