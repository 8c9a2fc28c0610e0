use crate::core_driver::{base_name, Driver, DriverError, FileInfo};
use crate::context::Context;
use crate::core_perm::{mode_string, Perm};
use chrono::{DateTime, Duration, Utc};

/// Strips leading `ls`-style options (`-la`, `-a`) from a LIST/NLST argument.
pub fn strip_list_options(arg: &str) -> &str {
    let mut rest = arg.trim();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

/// Entries of `path`, sorted by name and decorated by `perm`. A file yields
/// itself as the only entry.
pub async fn collect_entries(
    driver: &dyn Driver,
    perm: &dyn Perm,
    ctx: &Context,
    path: &str,
) -> Result<Vec<FileInfo>, DriverError> {
    let info = driver.stat(ctx, path).await?;
    let is_dir = info.is_dir;
    let mut entries = Vec::new();
    if is_dir {
        driver
            .list_dir(ctx, path, &mut |entry: FileInfo| {
                entries.push(entry);
                Ok(())
            })
            .await?;
    } else {
        entries.push(FileInfo {
            name: base_name(path).to_string(),
            ..info
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries
        .into_iter()
        .map(|entry| {
            let entry_path = child_path(path, &entry.name, is_dir);
            perm.decorate(&entry_path, entry)
        })
        .collect())
}

fn child_path(parent: &str, name: &str, parent_is_dir: bool) -> String {
    match (parent_is_dir, parent) {
        (false, _) => parent.to_string(),
        (true, "/") => format!("/{}", name),
        (true, _) => format!("{}/{}", parent, name),
    }
}

/// One `ls -l` style line, CRLF terminated. Entries older than six months
/// show the year instead of the time.
pub fn format_list_line(info: &FileInfo, now: DateTime<Utc>) -> String {
    let recent = (now - info.mod_time).abs() < Duration::days(182);
    let date = if recent {
        info.mod_time.format("%b %e %H:%M")
    } else {
        info.mod_time.format("%b %e  %Y")
    };
    format!(
        "{} 1 {} {} {:>12} {} {}\r\n",
        mode_string(info.mode, info.is_dir),
        info.owner,
        info.group,
        info.size,
        date,
        info.name
    )
}
