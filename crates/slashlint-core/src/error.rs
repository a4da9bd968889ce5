//! Error types for slashlint-core.

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while parsing a command document's frontmatter.
#[derive(Error, Debug)]
pub enum FrontmatterError {
    /// An opening `---` marker with no matching closing marker.
    #[error("frontmatter block is not terminated (missing closing ---)")]
    Unterminated,

    /// The block text failed to decode as YAML.
    #[error("invalid YAML in frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The block decoded, but not to a mapping of field names to values.
    #[error("frontmatter must be a mapping of field names to values")]
    NotAMapping,

    /// A field holds a YAML shape outside the supported grammar.
    #[error("field '{field}' has an unsupported value shape: {shape}")]
    UnsupportedShape {
        /// The offending field name.
        field: String,
        /// Short description of the shape that was found.
        shape: &'static str,
    },
}

/// Result type alias using [`FrontmatterError`].
pub type ParseResult<T> = Result<T, FrontmatterError>;
