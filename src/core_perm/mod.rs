use crate::core_driver::FileInfo;

/// Resolves ownership and mode bits shown in listings.
///
/// Only decorates metadata; it never decides whether an operation may run.
pub trait Perm: Send + Sync {
    fn get_owner(&self, path: &str) -> String;
    fn get_group(&self, path: &str) -> String;
    fn get_mode(&self, path: &str, info: &FileInfo) -> u32;

    /// Returns a copy of `info` carrying this resolver's owner, group and mode.
    fn decorate(&self, path: &str, info: FileInfo) -> FileInfo {
        let mode = self.get_mode(path, &info);
        let owner = self.get_owner(path);
        let group = self.get_group(path);
        info.with_ownership(mode, owner, group)
    }
}

/// Same owner and group for every path.
#[derive(Debug, Clone)]
pub struct SimplePerm {
    owner: String,
    group: String,
}

impl SimplePerm {
    pub fn new(owner: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
        }
    }
}

impl Perm for SimplePerm {
    fn get_owner(&self, _path: &str) -> String {
        self.owner.clone()
    }

    fn get_group(&self, _path: &str) -> String {
        self.group.clone()
    }

    fn get_mode(&self, _path: &str, info: &FileInfo) -> u32 {
        match (info.mode & 0o777, info.is_dir) {
            (0, true) => 0o755,
            (0, false) => 0o644,
            (mode, _) => mode,
        }
    }
}

/// Renders mode bits the way `ls -l` does, e.g. `drwxr-xr-x`.
pub fn mode_string(mode: u32, is_dir: bool) -> String {
    let mut out = String::with_capacity(10);
    out.push(if is_dir { 'd' } else { '-' });
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}
