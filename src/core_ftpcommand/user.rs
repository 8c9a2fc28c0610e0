use crate::helpers::send_response;
use crate::session::{AuthState, Session};
use log::info;

/// Starts (or restarts) a login sequence. Any previous login is dropped.
pub async fn handle_user_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let username = arg.trim().to_string();
    if session.is_authenticated() {
        info!("[session {}] USER received while logged in, logging out", session.id);
        session.state.registry.set_user(session.id, None);
    }
    session.driver = None;
    session.data_conn = None;
    session.restart_offset = None;
    session.current_dir = String::from("/");
    session.auth_state = AuthState::UserNamed(username);
    send_response(&mut session.writer, b"331 User name okay, need password.\r\n").await
}
