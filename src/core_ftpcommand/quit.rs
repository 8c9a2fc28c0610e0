use crate::helpers::send_response;
use crate::session::Session;
use log::info;

pub async fn handle_quit_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    info!("[session {}] {} sent QUIT", session.id, session.peer_addr);
    session.quit = true;
    send_response(&mut session.writer, b"221 Goodbye.\r\n").await
}
