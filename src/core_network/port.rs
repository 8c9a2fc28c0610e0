use crate::core_network::data_conn::DataConnection;
use crate::core_network::error::AddressError;
use crate::helpers::{send_line, send_response};
use crate::session::Session;
use log::{info, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Handles the PORT (Active Mode) FTP command.
pub async fn handle_port_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let parsed = parse_port_arg(&arg);
    set_active_address(session, parsed, "PORT").await
}

/// Handles the EPRT (extended active mode, RFC 2428) FTP command.
pub async fn handle_eprt_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let parsed = parse_eprt_arg(&arg);
    set_active_address(session, parsed, "EPRT").await
}

/// Records where to dial on the next transfer. Nothing is connected yet.
async fn set_active_address(
    session: &mut Session,
    parsed: Result<SocketAddr, AddressError>,
    verb: &str,
) -> Result<(), std::io::Error> {
    session.data_conn = None;
    let addr = match parsed {
        Ok(addr) => addr,
        Err(e) => return send_line(&mut session.writer, e.to_ftp_response()).await,
    };
    // data connections only go back to the client itself
    if !same_host(addr.ip(), session.peer_addr.ip()) {
        warn!(
            "[session {}] Refusing {} to {} from {}",
            session.id, verb, addr, session.peer_addr
        );
        return send_response(&mut session.writer, b"500 Illegal PORT command.\r\n").await;
    }

    info!("[session {}] Active data address {}", session.id, addr);
    session.data_conn = Some(DataConnection::active(addr));
    send_line(&mut session.writer, &format!("200 {} command successful.", verb)).await
}

fn same_host(a: IpAddr, b: IpAddr) -> bool {
    canonical(a) == canonical(b)
}

fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Parses a `PORT h1,h2,h3,h4,p1,p2` argument.
pub fn parse_port_arg(arg: &str) -> Result<SocketAddr, AddressError> {
    let syntax = || AddressError::Syntax(arg.to_string());
    let parts = arg
        .trim()
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| syntax())?;
    let [h1, h2, h3, h4, p1, p2] = parts[..] else {
        return Err(syntax());
    };
    let port = u16::from(p1) << 8 | u16::from(p2);
    if port == 0 {
        return Err(syntax());
    }
    Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4)), port))
}

/// Parses an `EPRT |af|addr|port|` argument (RFC 2428). The delimiter is the
/// first character and may be anything printable.
pub fn parse_eprt_arg(arg: &str) -> Result<SocketAddr, AddressError> {
    let syntax = || AddressError::Syntax(arg.to_string());
    let arg = arg.trim();
    let delim = arg.chars().next().ok_or_else(syntax)?;
    let fields: Vec<&str> = arg.split(delim).collect();
    // leading and trailing delimiters give empty first and last fields
    let ["", family, addr, port, ""] = fields[..] else {
        return Err(syntax());
    };

    let ip = match family {
        "1" => addr.parse::<Ipv4Addr>().map(IpAddr::V4).map_err(|_| syntax())?,
        "2" => addr.parse::<Ipv6Addr>().map(IpAddr::V6).map_err(|_| syntax())?,
        other => return Err(AddressError::UnsupportedFamily(other.to_string())),
    };
    let port = port.parse::<u16>().map_err(|_| syntax())?;
    if port == 0 {
        return Err(syntax());
    }
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_arg() {
        assert_eq!(
            parse_port_arg("127,0,0,1,195,203").unwrap(),
            SocketAddr::from(([127, 0, 0, 1], 50123))
        );
        assert!(parse_port_arg("127,0,0,1,195").is_err());
        assert!(parse_port_arg("127,0,0,1,195,203,1").is_err());
        assert!(parse_port_arg("300,0,0,1,1,1").is_err());
        assert!(parse_port_arg("a,b,c,d,e,f").is_err());
        assert!(parse_port_arg("127,0,0,1,0,0").is_err());
    }

    #[test]
    fn test_same_host_sees_through_mapped_ipv6() {
        let v4 = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let mapped = IpAddr::V6(Ipv4Addr::LOCALHOST.to_ipv6_mapped());
        assert!(same_host(v4, mapped));
        assert!(!same_host(v4, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
    }

    #[test]
    fn test_parse_eprt_arg() {
        assert_eq!(
            parse_eprt_arg("|1|132.235.1.2|6275|").unwrap(),
            SocketAddr::from(([132, 235, 1, 2], 6275))
        );
        assert_eq!(
            parse_eprt_arg("|2|::1|5282|").unwrap(),
            SocketAddr::from((Ipv6Addr::LOCALHOST, 5282))
        );
        assert_eq!(
            parse_eprt_arg("!1!10.0.0.1!21!").unwrap(),
            SocketAddr::from(([10, 0, 0, 1], 21))
        );
        assert_eq!(
            parse_eprt_arg("|3|foo|21|"),
            Err(AddressError::UnsupportedFamily("3".to_string()))
        );
        assert!(matches!(parse_eprt_arg("|1|::1|21|"), Err(AddressError::Syntax(_))));
        assert!(matches!(parse_eprt_arg("|1|10.0.0.1|21"), Err(AddressError::Syntax(_))));
        assert!(matches!(parse_eprt_arg(""), Err(AddressError::Syntax(_))));
    }
}
