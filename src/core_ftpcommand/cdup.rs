use crate::core_ftpcommand::cwd::handle_cwd_command;
use crate::session::Session;

pub async fn handle_cdup_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    handle_cwd_command(session, String::from("..")).await
}
