use crate::helpers::send_response;
use crate::session::Session;

const FEATURES: &[u8] = b"211-Features:\r\n \
EPRT\r\n \
EPSV\r\n \
MDTM\r\n \
PASV\r\n \
REST STREAM\r\n \
SIZE\r\n \
UTF8\r\n\
211 End\r\n";

pub async fn handle_feat_command(session: &mut Session, _arg: String) -> Result<(), std::io::Error> {
    send_response(&mut session.writer, FEATURES).await
}
