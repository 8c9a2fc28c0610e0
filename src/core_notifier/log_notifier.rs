use crate::context::Context;
use crate::core_notifier::{HookError, Notifier};
use log::{info, warn};

/// Writes one audit line per completed operation.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

fn outcome(err: HookError<'_>) -> String {
    match err {
        None => "ok".to_string(),
        Some(e) => format!("failed: {}", e),
    }
}

impl Notifier for LogNotifier {
    fn after_user_login(&self, ctx: &Context, user: &str, pass_matched: bool, err: HookError<'_>) {
        if pass_matched && err.is_none() {
            info!("[session {}] {} logged in as {}", ctx.session_id, ctx.peer_addr, user);
        } else {
            warn!(
                "[session {}] {} failed to log in as {} ({})",
                ctx.session_id,
                ctx.peer_addr,
                user,
                outcome(err)
            );
        }
    }

    fn after_file_put(&self, ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
        info!(
            "[session {}] {} STOR {} ({} bytes): {}",
            ctx.session_id,
            ctx.user_or_anonymous(),
            path,
            size,
            outcome(err)
        );
    }

    fn after_file_deleted(&self, ctx: &Context, path: &str, err: HookError<'_>) {
        info!(
            "[session {}] {} DELE {}: {}",
            ctx.session_id,
            ctx.user_or_anonymous(),
            path,
            outcome(err)
        );
    }

    fn after_cur_dir_changed(&self, ctx: &Context, old_dir: &str, new_dir: &str, err: HookError<'_>) {
        info!(
            "[session {}] {} CWD {} -> {}: {}",
            ctx.session_id,
            ctx.user_or_anonymous(),
            old_dir,
            new_dir,
            outcome(err)
        );
    }

    fn after_dir_created(&self, ctx: &Context, path: &str, err: HookError<'_>) {
        info!(
            "[session {}] {} MKD {}: {}",
            ctx.session_id,
            ctx.user_or_anonymous(),
            path,
            outcome(err)
        );
    }

    fn after_dir_deleted(&self, ctx: &Context, path: &str, err: HookError<'_>) {
        info!(
            "[session {}] {} RMD {}: {}",
            ctx.session_id,
            ctx.user_or_anonymous(),
            path,
            outcome(err)
        );
    }

    fn after_file_downloaded(&self, ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
        info!(
            "[session {}] {} RETR {} ({} bytes): {}",
            ctx.session_id,
            ctx.user_or_anonymous(),
            path,
            size,
            outcome(err)
        );
    }
}
