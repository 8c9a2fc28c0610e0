//! Before/after hooks around every mutating or session-changing operation.

pub mod log_notifier;

use crate::context::Context;
use log::error;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub use log_notifier::LogNotifier;

/// Error handed to `after_*` hooks; `None` means the operation succeeded.
pub type HookError<'a> = Option<&'a dyn Error>;

/// Borrows the error of `result`, if any, for an `after_*` hook.
pub fn hook_error<T, E: Error + 'static>(result: &Result<T, E>) -> HookError<'_> {
    result.as_ref().err().map(|e| e as &dyn Error)
}

/// Observer of session events. Every method defaults to doing nothing, so
/// implementors only override the hooks they care about.
pub trait Notifier: Send + Sync {
    fn before_login_user(&self, _ctx: &Context, _user: &str) {}
    fn before_put_file(&self, _ctx: &Context, _path: &str) {}
    fn before_delete_file(&self, _ctx: &Context, _path: &str) {}
    fn before_change_cur_dir(&self, _ctx: &Context, _old_dir: &str, _new_dir: &str) {}
    fn before_create_dir(&self, _ctx: &Context, _path: &str) {}
    fn before_delete_dir(&self, _ctx: &Context, _path: &str) {}
    fn before_download_file(&self, _ctx: &Context, _path: &str) {}

    fn after_user_login(&self, _ctx: &Context, _user: &str, _pass_matched: bool, _err: HookError<'_>) {}
    fn after_file_put(&self, _ctx: &Context, _path: &str, _size: u64, _err: HookError<'_>) {}
    fn after_file_deleted(&self, _ctx: &Context, _path: &str, _err: HookError<'_>) {}
    fn after_cur_dir_changed(&self, _ctx: &Context, _old_dir: &str, _new_dir: &str, _err: HookError<'_>) {}
    fn after_dir_created(&self, _ctx: &Context, _path: &str, _err: HookError<'_>) {}
    fn after_dir_deleted(&self, _ctx: &Context, _path: &str, _err: HookError<'_>) {}
    fn after_file_downloaded(&self, _ctx: &Context, _path: &str, _size: u64, _err: HookError<'_>) {}
}

/// Ordered fan-out over every registered notifier.
///
/// A notifier that panics is logged and skipped; the ones after it still run
/// and the wrapped operation still happens.
#[derive(Clone, Default)]
pub struct NotifierList {
    notifiers: Arc<Vec<Arc<dyn Notifier>>>,
}

impl NotifierList {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            notifiers: Arc::new(notifiers),
        }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    fn each(&self, hook: &str, call: impl Fn(&dyn Notifier)) {
        for (idx, notifier) in self.notifiers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(notifier.as_ref())));
            if outcome.is_err() {
                error!("Notifier #{} panicked in {}", idx, hook);
            }
        }
    }

    pub fn before_login_user(&self, ctx: &Context, user: &str) {
        self.each("before_login_user", |n| n.before_login_user(ctx, user));
    }

    pub fn before_put_file(&self, ctx: &Context, path: &str) {
        self.each("before_put_file", |n| n.before_put_file(ctx, path));
    }

    pub fn before_delete_file(&self, ctx: &Context, path: &str) {
        self.each("before_delete_file", |n| n.before_delete_file(ctx, path));
    }

    pub fn before_change_cur_dir(&self, ctx: &Context, old_dir: &str, new_dir: &str) {
        self.each("before_change_cur_dir", |n| {
            n.before_change_cur_dir(ctx, old_dir, new_dir)
        });
    }

    pub fn before_create_dir(&self, ctx: &Context, path: &str) {
        self.each("before_create_dir", |n| n.before_create_dir(ctx, path));
    }

    pub fn before_delete_dir(&self, ctx: &Context, path: &str) {
        self.each("before_delete_dir", |n| n.before_delete_dir(ctx, path));
    }

    pub fn before_download_file(&self, ctx: &Context, path: &str) {
        self.each("before_download_file", |n| n.before_download_file(ctx, path));
    }

    pub fn after_user_login(&self, ctx: &Context, user: &str, pass_matched: bool, err: HookError<'_>) {
        self.each("after_user_login", |n| {
            n.after_user_login(ctx, user, pass_matched, err)
        });
    }

    pub fn after_file_put(&self, ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
        self.each("after_file_put", |n| n.after_file_put(ctx, path, size, err));
    }

    pub fn after_file_deleted(&self, ctx: &Context, path: &str, err: HookError<'_>) {
        self.each("after_file_deleted", |n| n.after_file_deleted(ctx, path, err));
    }

    pub fn after_cur_dir_changed(&self, ctx: &Context, old_dir: &str, new_dir: &str, err: HookError<'_>) {
        self.each("after_cur_dir_changed", |n| {
            n.after_cur_dir_changed(ctx, old_dir, new_dir, err)
        });
    }

    pub fn after_dir_created(&self, ctx: &Context, path: &str, err: HookError<'_>) {
        self.each("after_dir_created", |n| n.after_dir_created(ctx, path, err));
    }

    pub fn after_dir_deleted(&self, ctx: &Context, path: &str, err: HookError<'_>) {
        self.each("after_dir_deleted", |n| n.after_dir_deleted(ctx, path, err));
    }

    pub fn after_file_downloaded(&self, ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
        self.each("after_file_downloaded", |n| {
            n.after_file_downloaded(ctx, path, size, err)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        label: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Notifier for Recorder {
        fn before_put_file(&self, _ctx: &Context, path: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:before:{}", self.label, path));
        }

        fn after_file_put(&self, _ctx: &Context, path: &str, size: u64, err: HookError<'_>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:after:{}:{}:{}", self.label, path, size, err.is_some()));
        }
    }

    struct Panicker;

    impl Notifier for Panicker {
        fn before_put_file(&self, _ctx: &Context, _path: &str) {
            panic!("boom");
        }
    }

    fn ctx() -> Context {
        Context::new(3, SocketAddr::from(([127, 0, 0, 1], 21)))
    }

    #[test]
    fn test_fan_out_keeps_registration_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let list = NotifierList::new(vec![
            Arc::new(Recorder {
                label: "first",
                events: Arc::clone(&events),
            }),
            Arc::new(Recorder {
                label: "second",
                events: Arc::clone(&events),
            }),
        ]);

        list.before_put_file(&ctx(), "/x");
        list.after_file_put(&ctx(), "/x", 4, None);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "first:before:/x",
                "second:before:/x",
                "first:after:/x:4:false",
                "second:after:/x:4:false",
            ]
        );
    }

    #[test]
    fn test_panicking_notifier_does_not_stop_others() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let list = NotifierList::new(vec![
            Arc::new(Panicker),
            Arc::new(Recorder {
                label: "survivor",
                events: Arc::clone(&events),
            }),
        ]);

        list.before_put_file(&ctx(), "/y");
        assert_eq!(*events.lock().unwrap(), vec!["survivor:before:/y"]);
    }

    #[test]
    fn test_after_hook_sees_error() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let list = NotifierList::new(vec![Arc::new(Recorder {
            label: "r",
            events: Arc::clone(&events),
        })]);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        list.after_file_put(&ctx(), "/z", 0, Some(&err));
        assert_eq!(*events.lock().unwrap(), vec!["r:after:/z:0:true"]);
    }
}
