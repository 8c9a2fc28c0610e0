use crate::core_ftpcommand::ftpcommand::{parse_command_line, FtpCommand};
use crate::core_ftpcommand::{
    abor, allo, cdup, cwd, dele, feat, list, mdtm, mkd, mode, noop, opts, pass, pwd, quit, rest,
    retr, rmd, rnfr, rnto, size, stor, stru, syst, type_, user,
};
use crate::core_network::{pasv, port};
use crate::helpers::send_response;
use crate::session::Session;
use log::debug;

/// Parses one command line and runs its handler.
///
/// An `Err` means the control connection is gone.
pub async fn dispatch(session: &mut Session, line: String) -> Result<(), std::io::Error> {
    let (verb, arg) = parse_command_line(&line);
    if verb == "PASS" {
        debug!("[session {}] <- PASS ****", session.id);
    } else {
        debug!("[session {}] <- {}", session.id, line);
    }

    let Some(command) = FtpCommand::from_str(&verb) else {
        return send_response(&mut session.writer, b"502 Command not implemented.\r\n").await;
    };
    if command.requires_auth() && !session.is_authenticated() {
        return send_response(&mut session.writer, b"530 Not logged in.\r\n").await;
    }
    if command.requires_arg() && arg.trim().is_empty() {
        return send_response(
            &mut session.writer,
            b"501 Syntax error in parameters or arguments.\r\n",
        )
        .await;
    }
    if !matches!(command, FtpCommand::RNFR | FtpCommand::RNTO) {
        session.rename_from = None;
    }

    match command {
        FtpCommand::USER => user::handle_user_command(session, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(session, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(session, arg).await,
        FtpCommand::PWD => pwd::handle_pwd_command(session, arg).await,
        FtpCommand::CWD => cwd::handle_cwd_command(session, arg).await,
        FtpCommand::CDUP => cdup::handle_cdup_command(session, arg).await,
        FtpCommand::LIST => list::handle_list_command(session, arg).await,
        FtpCommand::NLST => list::handle_nlst_command(session, arg).await,
        FtpCommand::MKD => mkd::handle_mkd_command(session, arg).await,
        FtpCommand::RMD => rmd::handle_rmd_command(session, arg).await,
        FtpCommand::DELE => dele::handle_dele_command(session, arg).await,
        FtpCommand::RNFR => rnfr::handle_rnfr_command(session, arg).await,
        FtpCommand::RNTO => rnto::handle_rnto_command(session, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(session, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(session, arg).await,
        FtpCommand::APPE => stor::handle_appe_command(session, arg).await,
        FtpCommand::TYPE => type_::handle_type_command(session, arg).await,
        FtpCommand::MODE => mode::handle_mode_command(session, arg).await,
        FtpCommand::STRU => stru::handle_stru_command(session, arg).await,
        FtpCommand::REST => rest::handle_rest_command(session, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(session, arg).await,
        FtpCommand::EPSV => pasv::handle_epsv_command(session, arg).await,
        FtpCommand::PORT => port::handle_port_command(session, arg).await,
        FtpCommand::EPRT => port::handle_eprt_command(session, arg).await,
        FtpCommand::ABOR => abor::handle_abor_command(session, arg).await,
        FtpCommand::SIZE => size::handle_size_command(session, arg).await,
        FtpCommand::MDTM => mdtm::handle_mdtm_command(session, arg).await,
        FtpCommand::FEAT => feat::handle_feat_command(session, arg).await,
        FtpCommand::OPTS => opts::handle_opts_command(session, arg).await,
        FtpCommand::SYST => syst::handle_syst_command(session, arg).await,
        FtpCommand::NOOP => noop::handle_noop_command(session, arg).await,
        FtpCommand::ALLO => allo::handle_allo_command(session, arg).await,
    }
}
