use crate::core_notifier::hook_error;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::info;

pub async fn handle_dele_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let path = session.resolve(&arg);
    let ctx = session.context();
    let notifiers = session.notifiers();

    notifiers.before_delete_file(&ctx, &path);
    let result = match session.driver() {
        Ok(driver) => driver.delete_file(&ctx, &path).await,
        Err(e) => Err(e),
    };
    notifiers.after_file_deleted(&ctx, &path, hook_error(&result));

    match result {
        Ok(()) => {
            info!("[session {}] Deleted {}", session.id, path);
            send_response(&mut session.writer, b"250 File deleted.\r\n").await
        }
        Err(e) => send_line(&mut session.writer, &e.to_ftp_response()).await,
    }
}
