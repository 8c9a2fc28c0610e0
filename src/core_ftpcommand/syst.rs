use crate::helpers::send_response;
use crate::session::Session;

pub async fn handle_syst_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    send_response(&mut session.writer, b"215 UNIX Type: L8\r\n").await
}
