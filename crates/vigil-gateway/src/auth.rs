// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the gateway.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user id. The middleware
//! verifies the token and places the resulting [`Identity`] in the request
//! extensions. Requests without a valid token are rejected (fail-closed).

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use vigil_config::model::AuthConfig;
use vigil_core::{
    AdapterType, HealthStatus, Identity, IdentityVerifier, PluginAdapter, UserId, VigilError,
};

use crate::error::ApiError;

/// Claims read from a client token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// HS256 JWT verifier.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Result<Self, VigilError> {
        if secret.is_empty() {
            return Err(VigilError::Config("auth.jwt_secret must not be empty".into()));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, VigilError> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| VigilError::Config("auth.jwt_secret is required to serve".into()))?;
        Self::new(secret, config.issuer.as_deref(), config.audience.as_deref())
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("key", &"[redacted]")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

#[async_trait]
impl PluginAdapter for JwtVerifier {
    fn name(&self) -> &str {
        "jwt-hs256"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VigilError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| VigilError::Unauthenticated(format!("invalid token: {e}")))?;
        if data.claims.sub.is_empty() {
            return Err(VigilError::Unauthenticated("token has no subject".into()));
        }
        Ok(Identity {
            user_id: UserId(data.claims.sub),
            email: data.claims.email,
        })
    }
}

/// Verifies the bearer token and attaches the caller's [`Identity`].
pub async fn auth_middleware(
    State(verifier): State<Arc<dyn IdentityVerifier>>,
    mut request: Request,
    next: axum::middleware::Next,
) -> Response {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return ApiError::from(VigilError::Unauthenticated("missing bearer token".into()))
            .into_response();
    };

    match verifier.verify(token).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected");
            ApiError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret-test-secret-test-secret";

    fn token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.into(),
            email: Some("a@b.c".into()),
            exp: 4_102_444_800,
            iss: None,
            aud: None,
        }
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let verifier = JwtVerifier::new(SECRET, None, None).unwrap();
        let identity = verifier.verify(&token(&claims("u1"), SECRET)).await.unwrap();
        assert_eq!(identity.user_id.as_str(), "u1");
        assert_eq!(identity.email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn wrong_secret_is_unauthenticated() {
        let verifier = JwtVerifier::new(SECRET, None, None).unwrap();
        let err = verifier
            .verify(&token(&claims("u1"), "another-secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let verifier = JwtVerifier::new(SECRET, None, None).unwrap();
        let mut expired = claims("u1");
        expired.exp = 1_000_000;
        assert!(verifier.verify(&token(&expired, SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn issuer_and_audience_are_enforced() {
        let verifier = JwtVerifier::new(SECRET, Some("vigil-auth"), Some("vigil-app")).unwrap();
        let mut good = claims("u1");
        good.iss = Some("vigil-auth".into());
        good.aud = Some("vigil-app".into());
        assert!(verifier.verify(&token(&good, SECRET)).await.is_ok());

        let mut bad = good.clone();
        bad.aud = Some("other-app".into());
        assert!(verifier.verify(&token(&bad, SECRET)).await.is_err());
    }

    #[tokio::test]
    async fn empty_subject_is_rejected() {
        let verifier = JwtVerifier::new(SECRET, None, None).unwrap();
        assert!(verifier.verify(&token(&claims(""), SECRET)).await.is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let verifier = JwtVerifier::new(SECRET, None, None).unwrap();
        let debug = format!("{verifier:?}");
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn missing_secret_is_config_error() {
        assert!(matches!(
            JwtVerifier::from_config(&AuthConfig::default()),
            Err(VigilError::Config(_))
        ));
    }
}
