use crate::core_driver::DriverError;
use crate::helpers::send_line;
use crate::session::Session;

pub async fn handle_size_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let path = session.resolve(&arg);
    let ctx = session.context();
    let result = match session.driver() {
        Ok(driver) => driver.stat(&ctx, &path).await,
        Err(e) => Err(e),
    };
    let reply = match result {
        Ok(info) if info.is_dir => DriverError::IsADirectory(path).to_ftp_response(),
        Ok(info) => format!("213 {}", info.size),
        Err(e) => e.to_ftp_response(),
    };
    send_line(&mut session.writer, &reply).await
}
