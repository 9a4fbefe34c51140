/// Things that can go wrong while assembling a map or feeding features into it.
///
/// Errors are reported at the boundary where they are detected; a failing
/// layer or payload never takes the rest of the map down with it.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Invalid value in the declarative configuration, or an unresolvable
    /// style identifier.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Layer identifier not present in the layer catalog.
    #[error("unknown layer id: {0}")]
    UnknownLayer(String),

    /// Unparsable WKT or bulk-format payload. No partial feature is created.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),

    /// Bulk ingestion was asked for a format this crate does not speak.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The location tool requires an empty features layer to start.
    #[error("the features layer already contains features")]
    FeaturesPresent,
}
