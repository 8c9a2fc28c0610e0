use crate::helpers::{send_line, send_response};
use crate::session::Session;

/// Sets the offset used by the next RETR, STOR or APPE only.
pub async fn handle_rest_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    match arg.trim().parse::<u64>() {
        Ok(offset) => {
            session.restart_offset = Some(offset);
            let reply = format!(
                "350 Restarting at {}. Send STORE or RETRIEVE to initiate transfer.",
                offset
            );
            send_line(&mut session.writer, &reply).await
        }
        Err(_) => {
            send_response(
                &mut session.writer,
                b"501 Syntax error in parameters or arguments.\r\n",
            )
            .await
        }
    }
}
