use crate::helpers::send_line;
use crate::session::Session;

/// Modification time as `YYYYMMDDHHMMSS`, UTC (RFC 3659).
pub async fn handle_mdtm_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let path = session.resolve(&arg);
    let ctx = session.context();
    let result = match session.driver() {
        Ok(driver) => driver.stat(&ctx, &path).await,
        Err(e) => Err(e),
    };
    let reply = match result {
        Ok(info) => format!("213 {}", info.mod_time.format("%Y%m%d%H%M%S")),
        Err(e) => e.to_ftp_response(),
    };
    send_line(&mut session.writer, &reply).await
}
