use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use loadsplit_core::SimulationConfig;
use thiserror::Error;

const TRANSFER_DOMAIN: &str = "loadsplit";
const TRANSFER_VERSION: &str = "v1";
/// Delimiter separating the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a configuration into a single-line string suitable for sharing a comparison setup.
#[must_use]
pub(crate) fn encode(config: &SimulationConfig) -> String {
    let json = serde_json::to_vec(config).expect("configuration serialization never fails");
    let encoded = STANDARD_NO_PAD.encode(json);
    format!("{TRANSFER_DOMAIN}{FIELD_DELIMITER}{TRANSFER_VERSION}{FIELD_DELIMITER}{encoded}")
}

/// Decodes a configuration from a share string.
pub(crate) fn decode(value: &str) -> Result<SimulationConfig, TransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TransferError::EmptyPayload);
    }

    let (domain, rest) = trimmed
        .split_once(FIELD_DELIMITER)
        .ok_or(TransferError::MissingVersion)?;
    let (version, payload) = rest
        .split_once(FIELD_DELIMITER)
        .ok_or(TransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(TransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(TransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(TransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(TransferError::InvalidPayload)
}

/// Errors that can occur while decoding share strings.
#[derive(Debug, Error)]
pub(crate) enum TransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("share string was empty")]
    EmptyPayload,
    /// The version segment was missing.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The payload segment was missing.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The prefix segment named another application.
    #[error("share prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment is not understood by this build.
    #[error("share version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode share payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload was not a valid configuration.
    #[error("could not parse share payload")]
    InvalidPayload(#[source] serde_json::Error),
}
