//! # Template Parser
//!
//! Reads Secret templates from a directory of YAML files.
//!
//! Each immediate file in the directory is read in file-name order. Whole-line
//! comments are stripped, the remainder is split on `---` delimiter lines, and
//! every non-blank document is decoded. Documents of a kind other than
//! `Secret` are discarded. A `Secret` that is not `v1`, or anything that fails
//! to decode, aborts the parse.

use crate::constants::{COMMENT_MARKER, DOCUMENT_DELIMITER, SECRET_API_VERSION, SECRET_KIND};
use crate::model::{ModelError, SecretTemplate};
use k8s_openapi::api::core::v1::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read template directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to read template file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document {index} in {} could not be decoded: {source}", .path.display())]
    Decode {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document {index} in {} has no kind", .path.display())]
    MissingKind { path: PathBuf, index: usize },
    #[error(
        "document {index} in {} is a Secret with apiVersion {}, expected {expected}",
        .path.display(),
        .api_version.as_deref().unwrap_or("<none>"),
        expected = SECRET_API_VERSION
    )]
    UnsupportedApiVersion {
        path: PathBuf,
        index: usize,
        api_version: Option<String>,
    },
    #[error("document {index} in {} is a Secret but does not match the Secret schema: {source}", .path.display())]
    InvalidSecret {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document {index} in {} is not a usable template: {source}", .path.display())]
    InvalidTemplate {
        path: PathBuf,
        index: usize,
        #[source]
        source: ModelError,
    },
}

/// Just enough of a document to decide whether it is a Secret
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeMeta {
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Parse every template in `dir`, in file order then document order.
pub fn parse_template_dir(dir: &Path) -> Result<Vec<SecretTemplate>, ParseError> {
    let files = find_template_files(dir)?;
    info!(
        dir = %dir.display(),
        files = files.len(),
        "Parsing template files"
    );

    let mut templates = Vec::new();
    for file in &files {
        templates.extend(parse_template_file(file)?);
    }
    Ok(templates)
}

/// Immediate regular files of `dir` sorted by file name. Symlinks are
/// followed, so projected volume layouts (`..data` links) resolve to files.
pub fn find_template_files(dir: &Path) -> Result<Vec<PathBuf>, ParseError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ParseError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn parse_template_file(path: &Path) -> Result<Vec<SecretTemplate>, ParseError> {
    debug!(file = %path.display(), "Reading template file");
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_documents(path, &content)
}

/// Parse the documents of one file. `path` is only used for error reporting.
pub fn parse_documents(path: &Path, content: &str) -> Result<Vec<SecretTemplate>, ParseError> {
    let stripped = strip_comment_lines(content);
    let mut templates = Vec::new();

    for (i, doc) in split_documents(&stripped).iter().enumerate() {
        let index = i + 1;
        if doc.trim().is_empty() {
            continue;
        }

        let type_meta: TypeMeta =
            serde_yaml::from_str(doc).map_err(|source| ParseError::Decode {
                path: path.to_path_buf(),
                index,
                source,
            })?;

        let Some(kind) = type_meta.kind else {
            return Err(ParseError::MissingKind {
                path: path.to_path_buf(),
                index,
            });
        };

        if kind != SECRET_KIND {
            debug!(
                file = %path.display(),
                index,
                kind = %kind,
                "Skipping non-Secret document"
            );
            continue;
        }

        if type_meta.api_version.as_deref() != Some(SECRET_API_VERSION) {
            return Err(ParseError::UnsupportedApiVersion {
                path: path.to_path_buf(),
                index,
                api_version: type_meta.api_version,
            });
        }

        let secret: Secret =
            serde_yaml::from_str(doc).map_err(|source| ParseError::InvalidSecret {
                path: path.to_path_buf(),
                index,
                source,
            })?;

        let template =
            SecretTemplate::from_manifest(secret).map_err(|source| ParseError::InvalidTemplate {
                path: path.to_path_buf(),
                index,
                source,
            })?;

        debug!(file = %path.display(), secret = %template.key(), "Parsed template");
        templates.push(template);
    }

    Ok(templates)
}

/// Drop lines that are comments once leading whitespace is trimmed.
/// Trailing comments on content lines are left alone.
#[must_use]
pub fn strip_comment_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with(COMMENT_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split on delimiter lines. Blank documents are kept so callers see the
/// source document numbering.
#[must_use]
pub fn split_documents(content: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim() == DOCUMENT_DELIMITER {
            documents.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    documents.push(current.join("\n"));
    documents
}
