use crate::core_notifier::hook_error;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::info;

/// Removes a directory together with everything below it.
pub async fn handle_rmd_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let path = session.resolve(&arg);
    let ctx = session.context();
    let notifiers = session.notifiers();

    notifiers.before_delete_dir(&ctx, &path);
    let result = match session.driver() {
        Ok(driver) => driver.delete_dir(&ctx, &path).await,
        Err(e) => Err(e),
    };
    notifiers.after_dir_deleted(&ctx, &path, hook_error(&result));

    match result {
        Ok(()) => {
            info!("[session {}] Removed directory {}", session.id, path);
            send_response(&mut session.writer, b"250 Directory removed.\r\n").await
        }
        Err(e) => send_line(&mut session.writer, &e.to_ftp_response()).await,
    }
}
