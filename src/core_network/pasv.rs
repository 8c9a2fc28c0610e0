use crate::core_network::data_conn::DataConnection;
use crate::core_network::error::DataConnError;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::{debug, error};
use rand::Rng;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassiveReply {
    Pasv(Ipv4Addr),
    Epsv,
}

/// Sets up a passive mode (PASV) listener and sends the 227 reply.
pub async fn handle_pasv_command(session: &mut Session, _arg: String) -> Result<(), io::Error> {
    session.data_conn = None;
    let configured = session.state.options.pasv_address;
    match advertised_ipv4(configured, session.local_addr) {
        Some(ip) => open_passive(session, PassiveReply::Pasv(ip)).await,
        None => {
            send_response(
                &mut session.writer,
                b"425 PASV needs an IPv4 address, use EPSV.\r\n",
            )
            .await
        }
    }
}

/// Extended passive mode (RFC 2428). `EPSV ALL` is acknowledged.
pub async fn handle_epsv_command(session: &mut Session, arg: String) -> Result<(), io::Error> {
    session.data_conn = None;
    if arg.trim().eq_ignore_ascii_case("ALL") {
        return send_response(&mut session.writer, b"200 EPSV ALL command successful.\r\n").await;
    }
    open_passive(session, PassiveReply::Epsv).await
}

async fn open_passive(session: &mut Session, reply: PassiveReply) -> Result<(), io::Error> {
    let options = &session.state.options;
    let bind_ip = session.local_addr.ip();
    let conn = bind_passive_listener(bind_ip, options.pasv_ports)
        .await
        .and_then(|listener| DataConnection::passive(listener, options.data_timeout))
        .map_err(DataConnError::Bind);
    let conn = match conn {
        Ok(conn) => conn,
        Err(e) => {
            error!("[session {}] {}", session.id, e);
            return send_line(&mut session.writer, e.to_ftp_response()).await;
        }
    };

    let port = conn.addr().port();
    debug!("[session {}] Passive data port {} opened", session.id, port);
    session.data_conn = Some(conn);
    let line = match reply {
        PassiveReply::Pasv(ip) => format_pasv_reply(ip, port),
        PassiveReply::Epsv => format_epsv_reply(port),
    };
    send_line(&mut session.writer, &line).await
}

/// Binds a passive listener on `ip`.
///
/// With a port range, the search starts at a random port inside it and walks
/// the range once, wrapping at the end; without one the OS picks the port.
pub async fn bind_passive_listener(
    ip: IpAddr,
    port_range: Option<(u16, u16)>,
) -> io::Result<TcpListener> {
    let Some((low, high)) = port_range else {
        return TcpListener::bind((ip, 0)).await;
    };
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let span = u32::from(high - low) + 1;
    let start = rand::thread_rng().gen_range(0..span);

    let mut last_err = None;
    for step in 0..span {
        let port = low + ((start + step) % span) as u16;
        match TcpListener::bind((ip, port)).await {
            Ok(listener) => {
                debug!("Passive listener bound on {}:{}", ip, port);
                return Ok(listener);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrInUse, "passive port range exhausted")
    }))
}

/// `227` reply. PASV can only describe IPv4 endpoints.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).",
        h1,
        h2,
        h3,
        h4,
        port >> 8,
        port & 0xff
    )
}

pub fn format_epsv_reply(port: u16) -> String {
    format!("229 Entering Extended Passive Mode (|||{}|).", port)
}

/// IPv4 address to advertise in a `227` reply, if there is one.
pub fn advertised_ipv4(configured: Option<IpAddr>, local: SocketAddr) -> Option<Ipv4Addr> {
    match configured.unwrap_or_else(|| local.ip()) {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped(),
    }
}
