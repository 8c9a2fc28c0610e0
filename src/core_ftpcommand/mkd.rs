use crate::core_notifier::hook_error;
use crate::helpers::{quote_path, send_line};
use crate::session::Session;

pub async fn handle_mkd_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let path = session.resolve(&arg);
    let ctx = session.context();
    let notifiers = session.notifiers();

    notifiers.before_create_dir(&ctx, &path);
    let result = match session.driver() {
        Ok(driver) => driver.make_dir(&ctx, &path).await,
        Err(e) => Err(e),
    };
    notifiers.after_dir_created(&ctx, &path, hook_error(&result));

    let reply = match result {
        Ok(()) => format!("257 {} directory created.", quote_path(&path)),
        Err(e) => e.to_ftp_response(),
    };
    send_line(&mut session.writer, &reply).await
}
