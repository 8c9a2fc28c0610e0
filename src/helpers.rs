use log::trace;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Sends a response to the client.
pub async fn send_response<W>(writer: &mut W, message: &[u8]) -> Result<(), io::Error>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(message).await?;
    writer.flush().await?;
    trace!("-> {}", String::from_utf8_lossy(message).trim_end());
    Ok(())
}

/// Sends one reply line, appending the CRLF.
pub async fn send_line<W>(writer: &mut W, line: &str) -> Result<(), io::Error>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut message = Vec::with_capacity(line.len() + 2);
    message.extend_from_slice(line.as_bytes());
    message.extend_from_slice(b"\r\n");
    send_response(writer, &message).await
}

/// Resolves `arg` against `current_dir` into an absolute path without `.`,
/// `..`, empty components or a trailing slash. `..` at the root stays at
/// the root, so the result never escapes `/`.
pub fn normalize_path(current_dir: &str, arg: &str) -> String {
    let arg = arg.replace('\\', "/");
    let joined = if arg.starts_with('/') {
        arg
    } else {
        format!("{}/{}", current_dir, arg)
    };
    let mut parts: Vec<&str> = Vec::new();
    for component in joined.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Quotes a path for a `257` reply; embedded quotes are doubled (RFC 959).
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}
