//! Zip archives of files and directory trees.
//!
//! Both single-file and directory jobs go through [`build_archive`]; they only
//! differ in the list of entries they hand it.

use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A file system object and the name it gets inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    pub name: String,
}

impl ArchiveEntry {
    pub fn new(source: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

/// Archive names always use `/`, whatever the platform separator.
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Everything below `root`, named relative to it. Links are listed, not descended into.
pub fn collect_tree(root: &Path) -> io::Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(root).map_err(io::Error::other)?;
        entries.push(ArchiveEntry::new(entry.path(), archive_name(relative)));
    }
    Ok(entries)
}

fn entry_options(meta: &Metadata) -> SimpleFileOptions {
    let mut options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(meta.len() >= u64::from(u32::MAX));

    if let Some(mtime) = meta.modified().ok().and_then(zip_time) {
        options = options.last_modified_time(mtime);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(meta.permissions().mode());
    }
    options
}

/// Zip timestamps are local, two-second resolution, and start in 1980.
fn zip_time(at: std::time::SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = at.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

/// How an entry ends up in the archive, decided from what is on disk.
enum Stored {
    File(Metadata),
    Directory(Metadata),
    Link(Metadata, PathBuf),
    Skipped,
}

/// Links to files are stored as the file they point at, so extracting the
/// archive gives back the data. Links to directories and dangling links
/// stay links. Sockets, FIFOs and devices are skipped.
fn classify(source: &Path) -> io::Result<Stored> {
    let meta = fs::symlink_metadata(source)?;
    if meta.file_type().is_symlink() {
        return Ok(match fs::metadata(source) {
            Ok(target) if target.is_file() => Stored::File(target),
            Ok(target) if !target.is_dir() => Stored::Skipped,
            _ => Stored::Link(meta, fs::read_link(source)?),
        });
    }
    Ok(if meta.is_dir() {
        Stored::Directory(meta)
    } else if meta.is_file() {
        Stored::File(meta)
    } else {
        Stored::Skipped
    })
}

fn write_entries(writer: &mut ZipWriter<File>, entries: &[ArchiveEntry]) -> io::Result<usize> {
    let mut written = 0;
    for entry in entries {
        match classify(&entry.source)? {
            Stored::File(meta) => {
                writer
                    .start_file(entry.name.as_str(), entry_options(&meta))
                    .map_err(io::Error::other)?;
                let mut reader = File::open(&entry.source)?;
                io::copy(&mut reader, writer)?;
            }
            Stored::Directory(meta) => writer
                .add_directory(entry.name.as_str(), entry_options(&meta))
                .map_err(io::Error::other)?,
            Stored::Link(meta, link_target) => writer
                .add_symlink(entry.name.as_str(), link_target.to_string_lossy(), entry_options(&meta))
                .map_err(io::Error::other)?,
            Stored::Skipped => {
                log::warn!("Skipping special file {}", entry.source.display());
                continue;
            }
        }
        written += 1;
    }
    Ok(written)
}

/// Write a deflate-compressed zip at `dest` and return how many entries it
/// holds. On failure the partial archive is removed.
pub fn build_archive(dest: &Path, entries: &[ArchiveEntry]) -> io::Result<usize> {
    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(file);

    let result = write_entries(&mut writer, entries)
        .and_then(|written| writer.finish().map(|_| written).map_err(io::Error::other));

    if result.is_err() {
        if let Err(e) = fs::remove_file(dest) {
            log::warn!("Could not remove partial archive {}: {}", dest.display(), e);
        }
    }
    result
}

fn not_a(path: &Path, expected: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} is not a {}", path.display(), expected),
    )
}

/// Archive a single file, stored under its base name only.
pub fn archive_file(src: &Path, dest: &Path) -> io::Result<usize> {
    if !fs::metadata(src)?.is_file() {
        return Err(not_a(src, "regular file"));
    }
    let name = src
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"))?;
    build_archive(dest, &[ArchiveEntry::new(src, name.to_string_lossy())])
}

/// Archive everything below `root`; the root itself is not an entry.
pub fn archive_tree(root: &Path, dest: &Path) -> io::Result<usize> {
    if !fs::metadata(root)?.is_dir() {
        return Err(not_a(root, "directory"));
    }
    let entries = collect_tree(root)?;
    build_archive(dest, &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Vec<u8> {
        let mut entry = archive.by_name(name).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        data
    }

    #[test]
    fn test_archive_name_uses_forward_slashes() {
        let relative: PathBuf = ["a", "b", "c.txt"].iter().collect();
        assert_eq!(archive_name(&relative), "a/b/c.txt");
    }

    #[test]
    fn test_single_file_archive() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("Test Files");
        fs::create_dir_all(&src_dir).unwrap();
        let src = src_dir.join("test.txt");
        fs::write(&src, b"line one\nline two\n").unwrap();
        let dest = dir.path().join("test.txt.240101-000000.zip");

        archive_file(&src, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).unwrap().name(), "test.txt");
        assert_eq!(archive.by_index(0).unwrap().compression(), CompressionMethod::Deflated);
        assert_eq!(read_entry(&mut archive, "test.txt"), b"line one\nline two\n");
    }

    #[test]
    fn test_tree_archive_keeps_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Test Directory");
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("top.txt"), b"top").unwrap();
        fs::write(root.join("sub/mid.txt"), b"mid").unwrap();
        fs::write(root.join("sub/deeper/low.txt"), b"low").unwrap();
        let dest = dir.path().join("tree.zip");

        let count = archive_tree(&root, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(count, archive.len());
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["empty/", "sub/", "sub/deeper/", "sub/deeper/low.txt", "sub/mid.txt", "top.txt"]
        );
        assert_eq!(read_entry(&mut archive, "top.txt"), b"top");
        assert_eq!(read_entry(&mut archive, "sub/mid.txt"), b"mid");
        assert_eq!(read_entry(&mut archive, "sub/deeper/low.txt"), b"low");
        assert!(archive.by_name("empty/").unwrap().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_archive_follows_file_links_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("real.txt"), b"REAL CONTENT").unwrap();
        std::os::unix::fs::symlink("real.txt", root.join("alias.txt")).unwrap();
        std::os::unix::fs::symlink("sub", root.join("sub-link")).unwrap();
        let dest = dir.path().join("links.zip");

        let count = archive_tree(&root, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(count, 4);
        assert_eq!(read_entry(&mut archive, "alias.txt"), b"REAL CONTENT");
        assert_eq!(read_entry(&mut archive, "real.txt"), b"REAL CONTENT");
        let mode = archive.by_name("sub-link").unwrap().unix_mode().unwrap();
        assert_eq!(mode & 0o170000, 0o120000);
        assert_eq!(read_entry(&mut archive, "sub-link"), b"sub");
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_archive_skips_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("data.txt"), b"data").unwrap();
        crate::testing::make_fifo(&root.join("pipe"));
        let dest = dir.path().join("fifo.zip");

        let count = archive_tree(&root, &dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(archive.len(), 1);
        assert!(archive.by_name("pipe").is_err());
        assert_eq!(read_entry(&mut archive, "data.txt"), b"data");
    }

    #[test]
    fn test_source_of_wrong_kind_writes_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        let tree_dest = dir.path().join("tree.zip");
        let file_dest = dir.path().join("file.zip");

        let err = archive_tree(&file, &tree_dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = archive_file(dir.path(), &file_dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        assert!(!tree_dest.exists());
        assert!(!file_dest.exists());
    }

    #[test]
    fn test_failed_archive_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("broken.zip");
        let entries = [ArchiveEntry::new(dir.path().join("missing.txt"), "missing.txt")];

        assert!(build_archive(&dest, &entries).is_err());
        assert!(!dest.exists());
    }
}
