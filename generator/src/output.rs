use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glbind_registry::Version;

/// `<out>/<family>/<major.minor>/<family>.<extension>`
pub fn package_path(out: &Path, family: &str, version: Version, extension: &str) -> PathBuf {
    out.join(family)
        .join(version.to_string())
        .join(format!("{family}.{extension}"))
}

/// Writes one emitted unit, creating its directory.
pub fn write_package(
    out: &Path,
    family: &str,
    version: Version,
    extension: &str,
    contents: &str,
) -> io::Result<PathBuf> {
    let path = package_path(out, family, version, extension);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "wrote package");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_family_and_version() {
        let path = package_path(Path::new("out"), "gles2", Version::new(3, 0), "go");
        assert_eq!(path, Path::new("out/gles2/3.0/gles2.go"));
    }

    #[test]
    fn writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let version = Version::new(4, 6);

        let path = write_package(dir.path(), "gl", version, "rs", "first").unwrap();
        assert_eq!(path, dir.path().join("gl").join("4.6").join("gl.rs"));
        write_package(dir.path(), "gl", version, "rs", "second").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "second");
    }
}
