use crate::helpers::send_response;
use crate::session::Session;

/// UTF-8 paths are always on; `OPTS UTF8 ON` is acknowledged for clients
/// that insist on asking.
pub async fn handle_opts_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let words: Vec<String> = arg.split_whitespace().map(str::to_ascii_uppercase).collect();
    match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["UTF8", "ON"] | ["UTF8"] => {
            send_response(&mut session.writer, b"200 UTF8 mode enabled.\r\n").await
        }
        _ => send_response(&mut session.writer, b"501 Option not understood.\r\n").await,
    }
}
