use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::info;

pub async fn handle_rnto_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let Some(from) = session.rename_from.take() else {
        return send_response(&mut session.writer, b"503 Bad sequence of commands.\r\n").await;
    };
    let to = session.resolve(&arg);
    let ctx = session.context();

    let result = match session.driver() {
        Ok(driver) => driver.rename(&ctx, &from, &to).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => {
            info!("[session {}] Renamed {} to {}", session.id, from, to);
            send_response(&mut session.writer, b"250 Rename successful.\r\n").await
        }
        Err(e) => send_line(&mut session.writer, &e.to_ftp_response()).await,
    }
}
