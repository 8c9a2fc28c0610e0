use crate::helpers::send_response;
use crate::session::{Session, TransferType};

/// Handles the TYPE FTP command.
///
/// `A` (optionally `A N`) selects ASCII; `I` and `L 8` select binary. Other
/// types and format controls are refused with 504.
pub async fn handle_type_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let parts: Vec<String> = arg.split_whitespace().map(str::to_ascii_uppercase).collect();
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();

    let (transfer_type, response): (Option<TransferType>, &[u8]) = match parts.as_slice() {
        ["A"] | ["A", "N"] => (Some(TransferType::Ascii), &b"200 Type set to A.\r\n"[..]),
        ["I"] | ["L", "8"] => (Some(TransferType::Binary), &b"200 Type set to I.\r\n"[..]),
        _ => (None, &b"504 Command not implemented for that parameter.\r\n"[..]),
    };
    if let Some(transfer_type) = transfer_type {
        session.transfer_type = transfer_type;
    }
    send_response(&mut session.writer, response).await
}
