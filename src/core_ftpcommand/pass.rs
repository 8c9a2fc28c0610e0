use crate::core_notifier::hook_error;
use crate::helpers::send_response;
use crate::session::{AuthState, Session};
use log::{info, warn};

/// Checks the password of the user named by `USER`.
///
/// `after_user_login` fires exactly once per attempt, whatever the outcome.
pub async fn handle_pass_command(session: &mut Session, arg: String) -> Result<(), std::io::Error> {
    let username = match &session.auth_state {
        AuthState::UserNamed(username) => username.clone(),
        _ => {
            return send_response(&mut session.writer, b"503 Login with USER first.\r\n").await;
        }
    };

    let ctx = session.context();
    let notifiers = session.notifiers();
    let options = &session.state.options;
    notifiers.before_login_user(&ctx, &username);

    let checked = options.auth.check_passwd(&ctx, &username, &arg).await;
    match checked {
        Ok(true) => {
            let driver = options.factory.new_driver(&ctx);
            notifiers.after_user_login(&ctx, &username, true, hook_error(&driver));
            match driver {
                Ok(driver) => {
                    info!(
                        "[session {}] User {} logged in from {}",
                        session.id, username, session.peer_addr
                    );
                    session.driver = Some(driver);
                    session.state.registry.set_user(session.id, Some(username.clone()));
                    session.auth_state = AuthState::Authenticated(username);
                    send_response(&mut session.writer, b"230 User logged in, proceed.\r\n").await
                }
                Err(e) => {
                    warn!("[session {}] No storage for {}: {}", session.id, username, e);
                    session.auth_state = AuthState::Unauthenticated;
                    send_response(&mut session.writer, b"530 Not logged in.\r\n").await
                }
            }
        }
        Ok(false) => {
            notifiers.after_user_login(&ctx, &username, false, None);
            warn!(
                "[session {}] Wrong password for {} from {}",
                session.id, username, session.peer_addr
            );
            session.auth_state = AuthState::Unauthenticated;
            send_response(&mut session.writer, b"530 Not logged in.\r\n").await
        }
        Err(e) => {
            notifiers.after_user_login(&ctx, &username, false, Some(&e));
            warn!("[session {}] Credential check failed for {}: {}", session.id, username, e);
            session.auth_state = AuthState::Unauthenticated;
            let reply = format!("{}\r\n", e.to_ftp_response());
            send_response(&mut session.writer, reply.as_bytes()).await
        }
    }
}
