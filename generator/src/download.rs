//! Fetching of registry documents and reference pages.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

use crate::docs::{self, DOC_SECTIONS, INDEX_FILE};

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.khronos.org/OpenGL/xml";
pub const DEFAULT_EGL_REGISTRY_URL: &str = "https://registry.khronos.org/EGL/api";
pub const DEFAULT_DOCS_URL: &str = "https://cvs.khronos.org/svn/repos/ogl/trunk/ecosystem/public/sdk/docs";

/// Registry documents with the base they are published under.
pub const REGISTRY_FILES: [(&str, &str); 4] = [
    ("gl.xml", DEFAULT_REGISTRY_URL),
    ("glx.xml", DEFAULT_REGISTRY_URL),
    ("wgl.xml", DEFAULT_REGISTRY_URL),
    ("egl.xml", DEFAULT_EGL_REGISTRY_URL),
];

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request for {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request for {url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("unable to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to read documentation index {}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: docs::DocError,
    },
}

pub fn join_url(base: &str, file: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file)
}

#[derive(Default)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Downloads `<base>/<file>` into `<odir>/<file>`, creating `odir` as needed.
    pub fn fetch(&self, base: &str, file: &str, odir: &Path) -> Result<PathBuf, DownloadError> {
        let url = join_url(base, file);
        tracing::info!(%url, "downloading");
        let http = |source| DownloadError::Http {
            url: url.clone(),
            source,
        };
        let response = self.client.get(&url).send().map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.clone(),
                status,
            });
        }
        let body = response.bytes().map_err(http)?;

        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source| DownloadError::Io { path, source }
        };
        fs::create_dir_all(odir).map_err(io(odir))?;
        let path = odir.join(file);
        fs::write(&path, &body).map_err(io(&path))?;
        Ok(path)
    }

    /// Downloads every registry document. With `base` set all of them come from there.
    pub fn pull_specs(&self, base: Option<&str>, odir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
        REGISTRY_FILES
            .iter()
            .map(|&(file, default_base)| self.fetch(base.unwrap_or(default_base), file, odir))
            .collect()
    }

    /// Downloads the index of every reference section and then each page it lists.
    pub fn pull_docs(&self, base: &str, odir: &Path) -> Result<usize, DownloadError> {
        let mut pages = 0;
        for section in DOC_SECTIONS {
            let section_url = join_url(base, section);
            let section_dir = odir.join(section);
            let index_path = self.fetch(&section_url, INDEX_FILE, &section_dir)?;
            let entries = docs::read_index(&index_path).map_err(|source| DownloadError::Index {
                path: index_path.clone(),
                source,
            })?;
            for entry in &entries {
                self.fetch(&section_url, &entry.file_name, &section_dir)?;
            }
            pages += entries.len();
        }
        Ok(pages)
    }
}
