use crate::helpers::{quote_path, send_line};
use crate::session::Session;

pub async fn handle_pwd_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    let reply = format!("257 {} is the current directory.", quote_path(&session.current_dir));
    send_line(&mut session.writer, &reply).await
}
