use serde::Serialize;

/// Closed set of failure kinds surfaced to callers of the resolution,
/// sampling and coverage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The geocoder returned no results for a boundary query.
    NotFound,
    /// The top geocoder result carries no polygon geometry.
    NoGeometry,
    /// Sub-area discovery found nothing usable after the full fan-out.
    NoCandidates,
    SamplingExhausted,
    CoverageExhausted,
    /// A single network call failed.
    Transport,
    InvalidGeometry,
    InvalidInput,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::NoGeometry => "no_geometry",
            ErrorKind::NoCandidates => "no_candidates",
            ErrorKind::SamplingExhausted => "sampling_exhausted",
            ErrorKind::CoverageExhausted => "coverage_exhausted",
            ErrorKind::Transport => "transport_error",
            ErrorKind::InvalidGeometry => "invalid_geometry",
            ErrorKind::InvalidInput => "bad_request",
            ErrorKind::Configuration => "configuration_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_code_for_domain_kinds() {
        let json = serde_json::to_string(&ErrorKind::CoverageExhausted).unwrap();
        assert_eq!(json, "\"coverage_exhausted\"");
        assert_eq!(ErrorKind::CoverageExhausted.code(), "coverage_exhausted");
    }

    #[test]
    fn transport_code_is_stable() {
        assert_eq!(ErrorKind::Transport.to_string(), "transport_error");
    }
}
