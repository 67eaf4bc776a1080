use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, info, warn};

use crate::config::issuer::{IssuerConfig, SigningAlgorithm};
use crate::grant::access_level::AccessLevel;
use crate::grant::claims::{AccessGrant, GrantClaims};
use crate::grant::error::{GrantError, GrantResult};
use crate::secret::shared_secret::SharedSecret;
use crate::utils::constants::{DEFAULT_VALIDITY_MINUTES, MAX_VALIDITY_MINUTES_LIMIT};

/// A freshly signed grant: the opaque token handed to the client plus the
/// grant it encodes.
#[derive(Debug, Clone)]
pub struct IssuedGrant {
    pub token: String,
    pub grant: AccessGrant,
}

/// Mints and checks signed, time-bounded document grants.
///
/// Holds nothing mutable, so one instance is shared by every request handler.
#[derive(Debug, Clone)]
pub struct GrantIssuer {
    secret: Arc<SharedSecret>,
    algorithm: SigningAlgorithm,
    default_validity: Duration,
    max_validity: Duration,
    leeway_seconds: u64,
}

impl GrantIssuer {
    pub fn new(secret: Arc<SharedSecret>, config: &IssuerConfig) -> Self {
        Self {
            secret,
            algorithm: config.algorithm,
            default_validity: minutes(config.default_validity_minutes),
            max_validity: minutes(config.max_validity_minutes),
            leeway_seconds: config.leeway_seconds,
        }
    }

    /// Load the configured secret and build the issuer around it.
    pub fn from_config(config: &IssuerConfig) -> GrantResult<Self> {
        let secret = SharedSecret::load(&config.secret, config.min_secret_bytes)?;
        info!(
            "grant issuer ready: algorithm={:?}, default validity={}m, max validity={}m",
            config.algorithm, config.default_validity_minutes, config.max_validity_minutes
        );
        Ok(Self::new(Arc::new(secret), config))
    }

    pub fn default_validity(&self) -> Duration {
        self.default_validity
    }

    pub fn issue_grant(
        &self,
        document_reference: &str,
        access_level: AccessLevel,
        validity: Option<Duration>,
    ) -> GrantResult<IssuedGrant> {
        self.issue_grant_at(document_reference, access_level, validity, Utc::now())
    }

    /// Same as [`GrantIssuer::issue_grant`] with an explicit issuance instant.
    pub fn issue_grant_at(
        &self,
        document_reference: &str,
        access_level: AccessLevel,
        validity: Option<Duration>,
        issued_at: DateTime<Utc>,
    ) -> GrantResult<IssuedGrant> {
        validate_document_reference(document_reference)?;
        let validity = self.resolve_validity(validity)?;

        // the wire format carries whole seconds only
        let issued_at = Utc
            .timestamp_opt(issued_at.timestamp(), 0)
            .single()
            .ok_or_else(|| GrantError::InvalidInput(format!("invalid issue time {}", issued_at)))?;
        let expires_at = issued_at
            .checked_add_signed(validity)
            .ok_or_else(|| GrantError::InvalidInput("expiration overflows".to_string()))?;

        let grant = AccessGrant {
            document_reference: document_reference.to_string(),
            access_level,
            issued_at,
            expires_at,
        };

        let token = encode(
            &Header::new(self.algorithm.into()),
            &grant.to_claims(),
            &EncodingKey::from_secret(self.secret.expose()),
        )
        .map_err(|e| GrantError::SigningError(e.to_string()))?;

        debug!(
            "issued grant: document='{}', access_level={}, exp={}",
            grant.document_reference,
            grant.access_level,
            grant.expires_at.timestamp()
        );
        Ok(IssuedGrant { token, grant })
    }

    /// Check a token the way the editing service does: signature, algorithm,
    /// expiration and claim shape.
    pub fn verify_grant(&self, token: &str) -> GrantResult<AccessGrant> {
        let mut validation = Validation::new(self.algorithm.into());
        validation.leeway = self.leeway_seconds;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<GrantClaims>(
            token.trim(),
            &DecodingKey::from_secret(self.secret.expose()),
            &validation,
        )
        .inspect_err(|e| warn!("grant verification failed: {}", e))?;

        AccessGrant::try_from(data.claims)
    }

    fn resolve_validity(&self, validity: Option<Duration>) -> GrantResult<Duration> {
        let validity = validity.unwrap_or(self.default_validity);
        let whole_seconds = Duration::seconds(validity.num_seconds());
        if whole_seconds <= Duration::zero() {
            return Err(GrantError::InvalidInput(format!(
                "validity must be at least one second, got {}s",
                validity.num_seconds()
            )));
        }
        if whole_seconds > self.max_validity {
            return Err(GrantError::InvalidInput(format!(
                "validity {}s exceeds the maximum of {}s",
                whole_seconds.num_seconds(),
                self.max_validity.num_seconds()
            )));
        }
        Ok(whole_seconds)
    }
}

fn validate_document_reference(document_reference: &str) -> GrantResult<()> {
    if document_reference.trim().is_empty() {
        return Err(GrantError::InvalidInput(
            "document reference must not be empty".to_string(),
        ));
    }
    document_reference
        .parse::<http::Uri>()
        .map(|_| ())
        .map_err(|e| {
            GrantError::InvalidInput(format!(
                "document reference '{}' is not a valid locator: {}",
                document_reference, e
            ))
        })
}

fn minutes(value: u64) -> Duration {
    let capped = value.min(MAX_VALIDITY_MINUTES_LIMIT);
    Duration::try_minutes(i64::try_from(capped).unwrap_or(i64::MAX))
        .unwrap_or_else(|| Duration::minutes(DEFAULT_VALIDITY_MINUTES as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::issuer::{SecretConfig, SecretEncoding, SecretSource};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::Value;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const OTHER_SECRET: &[u8] = b"fedcba9876543210fedcba9876543210";

    fn issuer_config(algorithm: SigningAlgorithm) -> IssuerConfig {
        IssuerConfig {
            algorithm,
            secret: SecretConfig {
                source: SecretSource::Literal { value: String::new() },
                encoding: SecretEncoding::Plain,
            },
            min_secret_bytes: 16,
            default_validity_minutes: 60,
            max_validity_minutes: 24 * 60,
            leeway_seconds: 0,
        }
    }

    fn issuer_with(secret: &[u8], algorithm: SigningAlgorithm) -> GrantIssuer {
        let secret = SharedSecret::from_bytes(secret.to_vec(), 16).unwrap();
        GrantIssuer::new(Arc::new(secret), &issuer_config(algorithm))
    }

    fn issuer() -> GrantIssuer {
        issuer_with(SECRET, SigningAlgorithm::HS256)
    }

    fn payload(token: &str) -> Value {
        let part = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(part).unwrap()).unwrap()
    }

    #[test]
    fn issued_token_decodes_to_inputs() {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let issued = issuer()
            .issue_grant_at("https://host/doc123.docx", AccessLevel::Edit, Some(Duration::minutes(60)), t)
            .unwrap();

        let claims = payload(&issued.token);
        assert_eq!(claims["document"]["url"], "https://host/doc123.docx");
        assert_eq!(claims["document"]["permissions"]["edit"], true);
        assert_eq!(claims["permissions"], 2);
        assert_eq!(claims["iat"], 1_700_000_000);
        assert_eq!(claims["exp"], 1_700_000_000 + 3600);
        assert_eq!(issued.grant.validity_seconds(), 3600);
    }

    #[test]
    fn verification_round_trip_and_wrong_secret() {
        let issued = issuer()
            .issue_grant("https://host/doc123.docx", AccessLevel::Comment, None)
            .unwrap();

        let grant = issuer().verify_grant(&issued.token).unwrap();
        assert_eq!(grant, issued.grant);
        assert_eq!(grant.validity_seconds(), 3600);

        let other = issuer_with(OTHER_SECRET, SigningAlgorithm::HS256);
        assert!(matches!(other.verify_grant(&issued.token), Err(GrantError::InvalidSignature)));
    }

    #[test]
    fn same_instant_same_inputs_same_signature() {
        let t = Utc::now();
        let a = issuer().issue_grant_at("/files/a.xlsx", AccessLevel::ViewOnly, None, t).unwrap();
        let b = issuer().issue_grant_at("/files/a.xlsx", AccessLevel::ViewOnly, None, t).unwrap();
        assert_eq!(a.token, b.token);

        let later = issuer()
            .issue_grant_at("/files/a.xlsx", AccessLevel::ViewOnly, None, t + Duration::seconds(5))
            .unwrap();
        assert_ne!(a.token, later.token);
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let issued = issuer()
            .issue_grant("https://host/doc123.docx", AccessLevel::ViewOnly, None)
            .unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let mutations: Vec<Box<dyn Fn(&mut Value)>> = vec![
            Box::new(|c: &mut Value| c["document"]["url"] = "https://host/other.docx".into()),
            Box::new(|c: &mut Value| {
                c["permissions"] = 2.into();
                c["document"]["permissions"]["comment"] = true.into();
                c["document"]["permissions"]["edit"] = true.into();
            }),
            Box::new(|c: &mut Value| c["exp"] = (c["exp"].as_i64().unwrap() + 86_400).into()),
        ];

        for mutate in mutations {
            let mut claims = payload(&issued.token);
            mutate(&mut claims);
            let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
            let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
            assert!(matches!(issuer().verify_grant(&forged), Err(GrantError::InvalidSignature)));
        }
    }

    #[test]
    fn expired_grant_is_rejected() {
        let two_hours_ago = Utc::now() - Duration::hours(2);
        let issued = issuer()
            .issue_grant_at("https://host/doc123.docx", AccessLevel::Edit, Some(Duration::minutes(60)), two_hours_ago)
            .unwrap();
        assert!(matches!(issuer().verify_grant(&issued.token), Err(GrantError::Expired)));
    }

    #[test]
    fn invalid_inputs_produce_no_token() {
        let issuer = issuer();
        assert!(matches!(
            issuer.issue_grant("", AccessLevel::Edit, None),
            Err(GrantError::InvalidInput(_))
        ));
        assert!(matches!(
            issuer.issue_grant("   ", AccessLevel::Edit, None),
            Err(GrantError::InvalidInput(_))
        ));
        assert!(matches!(
            issuer.issue_grant("doc with spaces.docx", AccessLevel::Edit, None),
            Err(GrantError::InvalidInput(_))
        ));
        assert!(matches!(
            issuer.issue_grant("https://host/a.docx", AccessLevel::Edit, Some(Duration::zero())),
            Err(GrantError::InvalidInput(_))
        ));
        assert!(matches!(
            issuer.issue_grant("https://host/a.docx", AccessLevel::Edit, Some(Duration::minutes(-5))),
            Err(GrantError::InvalidInput(_))
        ));
        assert!(matches!(
            issuer.issue_grant("https://host/a.docx", AccessLevel::Edit, Some(Duration::days(2))),
            Err(GrantError::InvalidInput(_))
        ));
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let issued = issuer_with(SECRET, SigningAlgorithm::HS512)
            .issue_grant("https://host/doc123.docx", AccessLevel::Edit, None)
            .unwrap();
        assert!(matches!(issuer().verify_grant(&issued.token), Err(GrantError::InvalidSignature)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(issuer().verify_grant("not-a-token"), Err(GrantError::Malformed(_))));
    }

    #[test]
    fn oversized_configured_windows_are_capped() {
        let mut config = issuer_config(SigningAlgorithm::HS256);
        config.default_validity_minutes = u64::MAX;
        config.max_validity_minutes = u64::MAX;
        let secret = SharedSecret::from_bytes(SECRET.to_vec(), 16).unwrap();

        let issuer = GrantIssuer::new(Arc::new(secret), &config);
        assert_eq!(
            issuer.default_validity(),
            Duration::minutes(MAX_VALIDITY_MINUTES_LIMIT as i64)
        );
        let issued = issuer
            .issue_grant("https://host/doc123.docx", AccessLevel::Edit, Some(Duration::days(30)))
            .unwrap();
        assert_eq!(issued.grant.validity_seconds(), 30 * 24 * 3600);
    }
}
