//! Read/write permission check.
//!
//! Every directory and file is checked before it is opened for parsing. A
//! path passes only when it is both readable and writable: the loader never
//! writes, but the editing layer will, and a page it cannot save is as good
//! as missing.
//!
//! On Unix the kernel is asked whether this process may read and write the
//! path (`access(2)` with `R_OK | W_OK`), which accounts for ownership,
//! groups and read-only mounts. Root passes that test for any file, so the
//! owner read and write bits must also be set. On every platform the path
//! must not be read-only and a non-mutating open (a directory listing, or
//! opening the file) must succeed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("{} is not readable", .0.display())]
    NotReadable(PathBuf),
    #[error("{} is not writable", .0.display())]
    NotWritable(PathBuf),
    #[error("cannot access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl AccessError {
    /// The path that failed the check.
    pub fn path(&self) -> &Path {
        match self {
            AccessError::Missing(path)
            | AccessError::NotReadable(path)
            | AccessError::NotWritable(path)
            | AccessError::Io { path, .. } => path,
        }
    }

    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AccessError::Missing(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => AccessError::NotReadable(path.to_path_buf()),
            _ => AccessError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Confirm `path` can be both read and written by this process.
pub fn check_accessible(path: &Path) -> Result<(), AccessError> {
    let metadata = fs::metadata(path).map_err(|e| AccessError::from_io(path, e))?;

    if !owner_can_read(&metadata) || !process_can(path, Permission::Read)? {
        return Err(AccessError::NotReadable(path.to_path_buf()));
    }
    if metadata.permissions().readonly()
        || !owner_can_write(&metadata)
        || !process_can(path, Permission::Write)?
    {
        return Err(AccessError::NotWritable(path.to_path_buf()));
    }

    if metadata.is_dir() {
        fs::read_dir(path).map_err(|e| AccessError::from_io(path, e))?;
    } else {
        fs::File::open(path).map_err(|e| AccessError::from_io(path, e))?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Permission {
    Read,
    Write,
}

/// Whether the kernel grants this process `wanted` on `path`.
#[cfg(unix)]
fn process_can(path: &Path, wanted: Permission) -> Result<bool, AccessError> {
    use rustix::fs::{Access, access};
    use rustix::io::Errno;

    let mode = match wanted {
        Permission::Read => Access::READ_OK,
        Permission::Write => Access::WRITE_OK,
    };
    const DENIED: [Errno; 4] = [Errno::ACCESS, Errno::PERM, Errno::ROFS, Errno::TXTBSY];

    match access(path, mode) {
        Ok(()) => Ok(true),
        Err(errno) if DENIED.contains(&errno) => Ok(false),
        Err(errno) => Err(AccessError::from_io(path, errno.into())),
    }
}

#[cfg(not(unix))]
fn process_can(_path: &Path, _wanted: Permission) -> Result<bool, AccessError> {
    Ok(true)
}

#[cfg(unix)]
fn owner_can_read(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o400 != 0
}

#[cfg(unix)]
fn owner_can_write(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o200 != 0
}

#[cfg(not(unix))]
fn owner_can_read(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(not(unix))]
fn owner_can_write(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writable_file_and_directory_pass() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.html");
        fs::write(&file, "<html/>").unwrap();

        assert!(check_accessible(tmp.path()).is_ok());
        assert!(check_accessible(&file).is_ok());
    }

    #[test]
    fn missing_path_is_reported() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.html");
        let err = check_accessible(&missing).unwrap_err();
        assert!(matches!(err, AccessError::Missing(_)));
        assert_eq!(err.path(), missing);
    }

    #[test]
    fn read_only_file_is_not_writable() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("locked.html");
        fs::write(&file, "<html/>").unwrap();
        let mut permissions = fs::metadata(&file).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&file, permissions).unwrap();

        let err = check_accessible(&file).unwrap_err();
        assert!(matches!(err, AccessError::NotWritable(_)));
        assert!(err.to_string().contains("locked.html"));
    }

    #[cfg(unix)]
    #[test]
    fn write_only_file_is_not_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("secret.html");
        fs::write(&file, "<html/>").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o200)).unwrap();

        let err = check_accessible(&file).unwrap_err();
        assert!(matches!(err, AccessError::NotReadable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("site");
        fs::create_dir(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).unwrap();

        let result = check_accessible(&dir);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();
        assert!(matches!(result, Err(AccessError::NotWritable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn process_access_agrees_with_owner_bits_for_own_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("page.html");
        fs::write(&file, "<html/>").unwrap();

        assert!(process_can(&file, Permission::Read).unwrap());
        assert!(process_can(&file, Permission::Write).unwrap());
        assert!(process_can(tmp.path(), Permission::Write).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn file_owned_by_root_is_not_writable_for_others() {
        use std::os::unix::fs::MetadataExt;

        // Owner bits allow writing (0644), but only root may write.
        let passwd = Path::new("/etc/passwd");
        let Ok(metadata) = fs::metadata(passwd) else {
            return;
        };
        if rustix::process::geteuid().is_root() || metadata.uid() != 0 {
            return;
        }

        assert!(process_can(passwd, Permission::Read).unwrap());
        assert!(!process_can(passwd, Permission::Write).unwrap());
        let err = check_accessible(passwd).unwrap_err();
        assert!(matches!(err, AccessError::NotWritable(_)));
    }
}
