use std::path::PathBuf;

/// Errors surfaced by [`crate::editor::EditableImage`] operations.
///
/// Filter-domain failures are absorbed into undo/reset transitions inside
/// `apply_filter` and never appear here; only load and save can fail past
/// the editor boundary.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The load path did not resolve to readable pixel data.
    #[error("image {path:?} does not exist or could not be decoded")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: Option<image::ImageError>,
    },

    /// The save destination exists and overwrite was not requested.
    #[error("image {0:?} already exists")]
    AlreadyExists(PathBuf),

    /// Encoding the current buffer to disk failed.
    #[error("failed to encode image {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A parameter snapshot violated its filter's valid domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid parameters for {filter}: {reason}")]
pub struct InvalidParameters {
    pub filter: &'static str,
    pub reason: String,
}

impl InvalidParameters {
    pub fn new(filter: &'static str, reason: impl Into<String>) -> Self {
        Self {
            filter,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{EditorError, InvalidParameters};

    #[test]
    fn already_exists_names_the_destination() {
        let err = EditorError::AlreadyExists(PathBuf::from("/photos/out.png"));
        assert!(err.to_string().contains("out.png"));
    }

    #[test]
    fn invalid_parameters_names_the_filter() {
        let err = InvalidParameters::new("box blur", "kernel size must be odd");
        assert_eq!(
            err.to_string(),
            "invalid parameters for box blur: kernel size must be odd"
        );
    }
}
