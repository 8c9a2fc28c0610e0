use crate::helpers::send_response;
use crate::session::Session;

/// Only file structure exists.
pub async fn handle_stru_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    if arg.trim().eq_ignore_ascii_case("F") {
        send_response(&mut session.writer, b"200 Structure set to F.\r\n").await
    } else {
        send_response(&mut session.writer, b"504 Command not implemented for that parameter.\r\n").await
    }
}
