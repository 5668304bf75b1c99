//! Where a description document comes from.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use xmltree::Element;

use crate::errors::DeviceError;
use crate::fetch::ContentFetcher;

/// Origin of an XML document.
///
/// Strings convert through [`Source::infer`]; build the variants directly
/// to skip the prefix check.
pub enum Source {
    /// Fetched with an HTTP GET.
    Url(String),
    /// Read from the local filesystem.
    Path(PathBuf),
    /// Read as-is from an already open reader.
    Stream(Box<dyn Read>),
}

impl Source {
    /// `http://` and `https://` strings are URLs, everything else is a path.
    pub fn infer(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Source::Url(source.to_string())
        } else {
            Source::Path(PathBuf::from(source))
        }
    }

    pub fn stream<R: Read + 'static>(reader: R) -> Self {
        Source::Stream(Box::new(reader))
    }

    /// Resolves the source and parses it, returning the document's root element.
    pub fn into_root<F>(self, fetcher: &F) -> Result<Element, DeviceError>
    where
        F: ContentFetcher + ?Sized,
    {
        let root = match self {
            Source::Url(url) => {
                let content = fetcher.get_content(&url)?;
                debug!(url = %url, "Parsing XML document");
                Element::parse(content.as_bytes())?
            }
            Source::Path(path) => {
                debug!(path = %path.display(), "Parsing XML file");
                let file = File::open(&path)?;
                Element::parse(BufReader::new(file))?
            }
            Source::Stream(reader) => {
                debug!("Parsing XML stream");
                Element::parse(reader)?
            }
        };
        Ok(root)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<&str> for Source {
    fn from(source: &str) -> Self {
        Source::infer(source)
    }
}

impl From<String> for Source {
    fn from(source: String) -> Self {
        Source::infer(&source)
    }
}

impl From<&String> for Source {
    fn from(source: &String) -> Self {
        Source::infer(source)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}
