use crate::core_driver::DriverError;
use crate::core_notifier::hook_error;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::debug;

/// Changes the working directory after checking the target is a directory.
pub async fn handle_cwd_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let old_dir = session.current_dir.clone();
    let new_dir = session.resolve(&arg);
    let ctx = session.context();
    let notifiers = session.notifiers();

    notifiers.before_change_cur_dir(&ctx, &old_dir, &new_dir);
    let result = match session.driver() {
        Ok(driver) => match driver.stat(&ctx, &new_dir).await {
            Ok(info) if info.is_dir => Ok(()),
            Ok(_) => Err(DriverError::NotADirectory(new_dir.clone())),
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    notifiers.after_cur_dir_changed(&ctx, &old_dir, &new_dir, hook_error(&result));

    match result {
        Ok(()) => {
            debug!("[session {}] CWD {} -> {}", session.id, old_dir, new_dir);
            session.current_dir = new_dir;
            send_response(&mut session.writer, b"250 Directory successfully changed.\r\n").await
        }
        Err(e) => send_line(&mut session.writer, &e.to_ftp_response()).await,
    }
}
