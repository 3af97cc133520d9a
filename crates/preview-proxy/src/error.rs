//! Error types for the preview proxy

use std::fmt;

#[derive(Debug)]
pub enum PreviewError {
    Fetch(Box<reqwest::Error>),
    Upstream(String),
    Decode(Box<image::ImageError>),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Fetch(err) => write!(f, "Fetch error: {}", err),
            PreviewError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            PreviewError::Decode(err) => write!(f, "Image error: {}", err),
            PreviewError::Io(err) => write!(f, "IO error: {}", err),
            PreviewError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PreviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreviewError::Fetch(err) => Some(err.as_ref()),
            PreviewError::Decode(err) => Some(err.as_ref()),
            PreviewError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PreviewError {
    fn from(err: reqwest::Error) -> Self {
        PreviewError::Fetch(Box::new(err))
    }
}

impl From<image::ImageError> for PreviewError {
    fn from(err: image::ImageError) -> Self {
        PreviewError::Decode(Box::new(err))
    }
}

impl From<std::io::Error> for PreviewError {
    fn from(err: std::io::Error) -> Self {
        PreviewError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for PreviewError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        PreviewError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display() {
        let err = PreviewError::Upstream("upstream returned status 404".to_string());
        assert_eq!(
            format!("{}", err),
            "Upstream error: upstream returned status 404"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = PreviewError::Config("missing CACHE_DIR".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing CACHE_DIR");
    }

    #[test]
    fn test_io_error_has_source() {
        let err: PreviewError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_is_debug() {
        let err = PreviewError::Upstream("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Upstream"));
    }
}
