use crate::helpers::send_response;
use crate::session::Session;

/// Only stream mode exists.
pub async fn handle_mode_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    if arg.trim().eq_ignore_ascii_case("S") {
        send_response(&mut session.writer, b"200 Mode set to S.\r\n").await
    } else {
        send_response(&mut session.writer, b"504 Command not implemented for that parameter.\r\n").await
    }
}
