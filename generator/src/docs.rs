//! One-line command summaries from the downloaded reference pages.
//!
//! Each `man<N>` section holds an `index.xml` listing its pages and one `refentry` page per
//! command family (`glUniform.xml` documents every `glUniform*` variant). Lookups therefore match
//! the longest documented base name that prefixes the command name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;

pub const DOC_SECTIONS: [&str; 3] = ["man2", "man3", "man4"];
pub const INDEX_FILE: &str = "index.xml";

#[derive(Debug, Error)]
pub enum DocError {
    #[error("unable to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse {}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Documented name without call prefix, `Uniform` for `glUniform.xml`.
    pub base_name: String,
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandDoc {
    pub base_name: String,
    pub purpose: String,
}

fn parse(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options)
}

fn read(path: &Path) -> Result<String, DocError> {
    fs::read_to_string(path).map_err(|source| DocError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lists the core command pages of an index, skipping GLU and GLX pages.
pub fn parse_index(text: &str) -> Result<Vec<IndexEntry>, roxmltree::Error> {
    let document = parse(text)?;
    let entries = document
        .descendants()
        .filter(|node| node.has_tag_name("file"))
        .filter_map(|node| node.attribute("href"))
        .filter(|href| !href.starts_with("glu") && !href.starts_with("glX"))
        .filter_map(|href| {
            let base_name = href.strip_suffix(".xml").unwrap_or(href).strip_prefix("gl")?;
            Some(IndexEntry {
                base_name: base_name.to_string(),
                file_name: href.to_string(),
            })
        })
        .collect();
    Ok(entries)
}

pub fn read_index(path: &Path) -> Result<Vec<IndexEntry>, DocError> {
    parse_index(&read(path)?).map_err(|source| DocError::Xml {
        path: path.to_path_buf(),
        source,
    })
}

fn collapsed_text(node: Node) -> String {
    let text: Vec<&str> = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .flat_map(str::split_whitespace)
        .collect();
    text.join(" ")
}

/// Extracts `refentry/refnamediv/refpurpose` from a reference page.
pub fn parse_purpose(text: &str) -> Result<Option<String>, roxmltree::Error> {
    let document = parse(text)?;
    let purpose = document
        .descendants()
        .find(|node| node.has_tag_name("refnamediv"))
        .and_then(|div| div.children().find(|node| node.has_tag_name("refpurpose")))
        .map(collapsed_text)
        .filter(|purpose| !purpose.is_empty());
    Ok(purpose)
}

/// The reference section covering `major`. Versions before 3 share `man2`.
pub fn section_major(major: u32) -> u32 {
    major.max(2)
}

pub fn reference_url(base_name: &str, major: u32) -> String {
    format!(
        "https://www.opengl.org/sdk/docs/man{}/xhtml/gl{base_name}.xml",
        section_major(major)
    )
}

/// Summaries per reference section, each sorted by base name.
#[derive(Clone, Debug, Default)]
pub struct DocIndex {
    sections: BTreeMap<u32, Vec<CommandDoc>>,
}

impl DocIndex {
    pub fn new(sections: impl IntoIterator<Item = (u32, Vec<CommandDoc>)>) -> Self {
        let sections = sections
            .into_iter()
            .map(|(major, mut docs)| {
                docs.sort_by(|a, b| a.base_name.cmp(&b.base_name));
                (major, docs)
            })
            .collect();
        Self { sections }
    }

    /// Reads every section under `dir`. Missing sections and unreadable pages are skipped.
    pub fn load(dir: &Path) -> Result<Self, DocError> {
        let mut sections = Vec::new();
        for (major, section) in (2..).zip(DOC_SECTIONS) {
            let section_dir = dir.join(section);
            let index_path = section_dir.join(INDEX_FILE);
            if !index_path.is_file() {
                tracing::debug!(path = %index_path.display(), "no documentation index");
                continue;
            }

            let mut docs = Vec::new();
            for entry in read_index(&index_path)? {
                let page_path = section_dir.join(&entry.file_name);
                let purpose = read(&page_path).and_then(|text| {
                    parse_purpose(&text).map_err(|source| DocError::Xml {
                        path: page_path.clone(),
                        source,
                    })
                });
                match purpose {
                    Ok(Some(purpose)) => docs.push(CommandDoc {
                        base_name: entry.base_name,
                        purpose,
                    }),
                    Ok(None) => {}
                    Err(error) => tracing::warn!("skipping reference page: {error}"),
                }
            }
            tracing::info!(section, pages = docs.len(), "loaded documentation");
            sections.push((major, docs));
        }
        Ok(Self::new(sections))
    }

    /// Finds the page whose base name is the longest prefix of `name`.
    pub fn lookup(&self, major: u32, name: &str) -> Option<&CommandDoc> {
        let docs = self.sections.get(&section_major(major))?;
        let end = docs.partition_point(|doc| doc.base_name.as_str() <= name);
        docs[..end]
            .iter()
            .rev()
            .find(|doc| name.starts_with(&doc.base_name))
    }

    /// `purpose (reference URL)` for `name`, when documented.
    pub fn annotation(&self, major: u32, name: &str) -> Option<String> {
        self.lookup(major, name)
            .map(|doc| format!("{} ({})", doc.purpose, reference_url(&doc.base_name, major)))
    }
}
