use crate::helpers::send_response;
use crate::session::Session;

pub async fn handle_allo_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    send_response(&mut session.writer, b"202 No storage allocation necessary.\r\n").await
}
