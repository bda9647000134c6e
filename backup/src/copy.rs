use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub files: u64,
    pub dirs: u64,
    pub links: u64,
    /// Sockets, FIFOs and device nodes, which are left out.
    pub skipped: u64,
}

fn wrong_kind(path: &Path, expected: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} is not a {}", path.display(), expected),
    )
}

fn file_times(meta: &Metadata) -> FileTimes {
    let mut times = FileTimes::new();
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    times
}

/// Copy contents, timestamps and permissions of a single file. Permissions go
/// last so a read-only source still yields a writable handle while copying.
/// Nothing is created unless `src` is a regular file.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let meta = fs::metadata(src)?;
    if !meta.is_file() {
        return Err(wrong_kind(src, "regular file"));
    }

    let mut reader = File::open(src)?;
    let mut writer = File::create(dst)?;
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.set_times(file_times(&meta))?;
    drop(writer);

    fs::set_permissions(dst, meta.permissions())?;
    Ok(bytes)
}

#[cfg(unix)]
fn make_symlink(link_target: &Path, _src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link_target, dst)
}

#[cfg(windows)]
fn make_symlink(link_target: &Path, src: &Path, dst: &Path) -> io::Result<()> {
    if fs::metadata(src).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(link_target, dst)
    } else {
        std::os::windows::fs::symlink_file(link_target, dst)
    }
}

/// Recreate `src` as a link with the same (possibly relative) target.
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link_target = fs::read_link(src)?;
    match fs::symlink_metadata(dst) {
        Ok(existing) if existing.is_dir() => fs::remove_dir_all(dst)?,
        Ok(_) => fs::remove_file(dst)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    make_symlink(&link_target, src, dst)
}

fn copy_dir_metadata(meta: &Metadata, dst: &Path) {
    if let Err(e) = File::open(dst).and_then(|dir| dir.set_times(file_times(meta))) {
        log::debug!("Could not copy timestamps to {}: {}", dst.display(), e);
    }
    if let Err(e) = fs::set_permissions(dst, meta.permissions()) {
        log::debug!("Could not copy permissions to {}: {}", dst.display(), e);
    }
}

/// Copy a directory tree into `dst`, merging with whatever is already there.
/// Symlinks are recreated, never followed, and special files are skipped.
/// Directories are visited after their contents so their metadata is
/// applied once nothing else writes into them.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<TreeStats> {
    if !fs::metadata(src)?.is_dir() {
        return Err(wrong_kind(src, "directory"));
    }
    let mut stats = TreeStats::default();
    fs::create_dir_all(dst)?;

    for entry in WalkDir::new(src).follow_links(false).contents_first(true).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            copy_dir_metadata(&entry.metadata()?, &target);
            if entry.depth() > 0 {
                stats.dirs += 1;
            }
            continue;
        }
        if !file_type.is_symlink() && !file_type.is_file() {
            log::warn!("Skipping special file {}", entry.path().display());
            stats.skipped += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            stats.links += 1;
        } else {
            copy_file(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    Ok(stats)
}
