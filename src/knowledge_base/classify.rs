//! Mapping of free-text query failures onto client-facing error classes.
//!
//! The managed service reports failures as prose, so this relies on substring matches against
//! its wording. Keep every rule here; call sites only see [`QueryFailure`].

/// Class of a failed retrieve-and-generate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFailure {
    /// Credential or permission problem.
    Unauthorized,
    /// Malformed foundation model reference.
    InvalidModelReference,
    /// Anything else.
    Upstream,
}

const CREDENTIAL_MARKERS: [&str; 3] = ["access denied", "authentication", "credential"];

/// Classify an upstream error message. Matching is case-insensitive and credential markers win
/// over the model-reference rule.
pub fn classify_query_failure(message: &str) -> QueryFailure {
    let lowered = message.to_lowercase();
    if CREDENTIAL_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        QueryFailure::Unauthorized
    } else if lowered.contains("validation") && lowered.contains("modela") {
        QueryFailure::InvalidModelReference
    } else {
        QueryFailure::Upstream
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryFailure, classify_query_failure};

    #[test]
    fn credential_markers_map_to_unauthorized() {
        for message in [
            "The security token included in the request is invalid: Credential should be scoped",
            "AccessDeniedException: Access Denied for this resource",
            "Authentication failed",
            "unable to load CREDENTIALS from provider chain",
        ] {
            assert_eq!(
                classify_query_failure(message),
                QueryFailure::Unauthorized,
                "{message}"
            );
        }
    }

    #[test]
    fn validation_with_model_reference_maps_to_invalid_model() {
        assert_eq!(
            classify_query_failure(
                "ValidationException: 1 validation error detected: Value at 'modelArn' failed"
            ),
            QueryFailure::InvalidModelReference
        );
        assert_eq!(
            classify_query_failure("VALIDATION failed for MODELARN"),
            QueryFailure::InvalidModelReference
        );
    }

    #[test]
    fn validation_alone_is_generic() {
        assert_eq!(
            classify_query_failure("ValidationException: input text too long"),
            QueryFailure::Upstream
        );
        assert_eq!(
            classify_query_failure("modelArn is unknown"),
            QueryFailure::Upstream
        );
    }

    #[test]
    fn credential_rule_takes_precedence() {
        assert_eq!(
            classify_query_failure("validation of modelArn failed: credential expired"),
            QueryFailure::Unauthorized
        );
    }

    #[test]
    fn unrelated_messages_are_generic() {
        assert_eq!(
            classify_query_failure("ThrottlingException: Rate exceeded"),
            QueryFailure::Upstream
        );
    }
}
