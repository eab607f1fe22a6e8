use std::path::PathBuf;

/// Coarse error classification, one per failure class a caller may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parameter,
    Memory,
    FileOpen,
    FileRead,
    FileType,
    FileSize,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    Parameter(String),

    #[error("Failed to allocate buffer of {0} elements")]
    Memory(usize),

    #[error("Failed to open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file {}: {reason}", path.display())]
    FileType { path: PathBuf, reason: String },

    #[error("Loaded {loaded} of {expected} layers from {}", path.display())]
    FileSize {
        path: PathBuf,
        loaded: usize,
        expected: usize,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parameter(_) => ErrorKind::Parameter,
            Error::Memory(_) => ErrorKind::Memory,
            Error::FileOpen { .. } => ErrorKind::FileOpen,
            Error::FileRead { .. } => ErrorKind::FileRead,
            Error::FileType { .. } => ErrorKind::FileType,
            Error::FileSize { .. } => ErrorKind::FileSize,
        }
    }

    pub(crate) fn parameter(msg: impl Into<String>) -> Self {
        Error::Parameter(msg.into())
    }

    pub(crate) fn file_type(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::FileType {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Allocate a buffer of `len` copies of `fill`, reporting allocation failure
/// instead of aborting.
pub(crate) fn alloc_filled<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Memory(len))?;
    buf.resize(len, fill);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Error::parameter("x").kind(), ErrorKind::Parameter);
        assert_eq!(Error::Memory(4).kind(), ErrorKind::Memory);
        let e = Error::FileSize {
            path: PathBuf::from("a.toml"),
            loaded: 1,
            expected: 2,
        };
        assert_eq!(e.kind(), ErrorKind::FileSize);
        assert_eq!(e.to_string(), "Loaded 1 of 2 layers from a.toml");
    }

    #[test]
    fn alloc_filled_fills() {
        let buf = alloc_filled(5, 7u8).unwrap();
        assert_eq!(buf, vec![7; 5]);
    }

    #[test]
    fn alloc_filled_reports_impossible_sizes() {
        let err = alloc_filled(usize::MAX, 0u64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Memory);
    }
}
