use std::fmt;

/// Why a Google ID token was accepted or rejected.
///
/// Callers of the sign-in contract only see [`is_valid`]; the individual
/// variants exist for logging and tests.
///
/// [`is_valid`]: VerificationOutcome::is_valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    CustomAccepted,
    CustomRejected,
    PrimaryOk,
    FallbackOk { client_id: String },
    Disabled,
    NoFallbackConfigured,
    IntrospectionUnreachable,
    AudienceMismatch,
    IssuerMismatch,
    UnexpectedError,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            VerificationOutcome::CustomAccepted
                | VerificationOutcome::PrimaryOk
                | VerificationOutcome::FallbackOk { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::CustomAccepted => "custom_accepted",
            VerificationOutcome::CustomRejected => "custom_rejected",
            VerificationOutcome::PrimaryOk => "primary_ok",
            VerificationOutcome::FallbackOk { .. } => "fallback_ok",
            VerificationOutcome::Disabled => "disabled",
            VerificationOutcome::NoFallbackConfigured => "no_fallback_configured",
            VerificationOutcome::IntrospectionUnreachable => "introspection_unreachable",
            VerificationOutcome::AudienceMismatch => "audience_mismatch",
            VerificationOutcome::IssuerMismatch => "issuer_mismatch",
            VerificationOutcome::UnexpectedError => "unexpected_error",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VerificationOutcome> for bool {
    fn from(value: VerificationOutcome) -> Self {
        value.is_valid()
    }
}
