/*!
 * Error types for the namekeep application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Why a single candidate term could not be resolved.
///
/// These never abort a resolution batch; they are reported per term.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProposalFailure {
    /// The translation capability returned an error
    #[error("translation proposal failed: {0}")]
    Provider(String),

    /// The translation capability did not answer in time
    #[error("translation proposal timed out after {0:?}")]
    TimedOut(Duration),

    /// The batch was cancelled before this term was proposed
    #[error("translation proposal cancelled")]
    Cancelled,

    /// The translation capability answered with nothing usable
    #[error("translation proposal was empty")]
    EmptyProposal,

    /// The candidate term is empty after normalization
    #[error("candidate term is empty after normalization")]
    InvalidTerm,
}

impl From<ProviderError> for ProposalFailure {
    fn from(error: ProviderError) -> Self {
        Self::Provider(error.to_string())
    }
}

/// Errors raised by the glossary store
#[derive(Error, Debug)]
pub enum GlossaryError {
    /// Malformed input, rejected before any state change
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Writing the glossary to durable storage failed
    #[error("Failed to persist glossary to {location}: {message}")]
    Persistence {
        /// Where the glossary was being written
        location: String,
        /// Underlying failure
        message: String,
    },

    /// The persisted glossary could not be read back
    #[error("Glossary at {location} is corrupt: {message}")]
    Corrupt {
        /// Where the glossary was read from
        location: String,
        /// What is wrong with it
        message: String,
    },

    /// An operator action named a term the glossary does not know
    #[error("Unknown glossary term: {0}")]
    UnknownTerm(String),
}
