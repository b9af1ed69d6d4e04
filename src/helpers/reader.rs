use crate::spreadsheet::LoadError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Seek;
use std::path::PathBuf;
use url::Url;

/// A reader over a workbook source: a local file or an in-memory buffer
pub(crate) enum SourceReader {
    /// Local file reader
    Local(BufReader<File>),
    /// In-memory buffer (uploaded bytes, tests)
    Memory(Cursor<Vec<u8>>),
}

impl SourceReader {
    /// Opens a workbook from a local path or a `file://` URL.
    ///
    /// Remote URLs are rejected: the workbook is read once at startup from
    /// local storage only.
    pub(crate) fn open(location: &str) -> Result<SourceReader, LoadError> {
        let path = Self::resolve_path(location)?;
        let file = File::open(&path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => LoadError::NotFound(location.to_owned()),
            _ => LoadError::Io(error),
        })?;
        Ok(SourceReader::Local(BufReader::new(file)))
    }

    /// Wraps an in-memory workbook image
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> SourceReader {
        SourceReader::Memory(Cursor::new(bytes))
    }

    /// Maps a location to a local path, accepting `file://` URLs
    pub(crate) fn resolve_path(location: &str) -> Result<PathBuf, LoadError> {
        if Self::is_remote_url(location) {
            return Err(LoadError::RemoteSource(location.to_owned()));
        }
        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| LoadError::NotFound(location.to_owned())),
            _ => Ok(PathBuf::from(location)),
        }
    }

    /// Checks if a location is a URL with a non-`file` scheme.
    /// Single-letter schemes are Windows drive letters, not URLs.
    pub(crate) fn is_remote_url(location: &str) -> bool {
        if let Ok(url) = Url::parse(location) {
            url.scheme() != "file" && url.scheme().len() > 1
        } else {
            false
        }
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SourceReader::Local(reader) => reader.read(buf),
            SourceReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            SourceReader::Local(reader) => reader.seek(pos),
            SourceReader::Memory(reader) => reader.seek(pos),
        }
    }
}
