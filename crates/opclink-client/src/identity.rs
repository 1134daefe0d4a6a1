// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User identities presented during session activation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ClientResult;
use crate::types::EndpointDescription;

// =============================================================================
// UserIdentity
// =============================================================================

/// The identity a session is activated with.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum UserIdentity {
    /// No credentials.
    #[default]
    Anonymous,

    /// Username and password.
    UserName {
        /// The user name.
        username: String,
        /// The password.
        password: String,
    },

    /// An externally issued token (e.g. JWT).
    IssuedToken {
        /// The opaque token bytes.
        token_data: Vec<u8>,
    },

    /// Certificate-based identity.
    X509 {
        /// DER-encoded certificate.
        certificate: Vec<u8>,
        /// PKCS#8 private key.
        private_key: Vec<u8>,
    },
}

impl UserIdentity {
    /// Creates a username/password identity.
    pub fn user_name(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::UserName {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates an issued-token identity.
    pub fn issued_token(token_data: Vec<u8>) -> Self {
        Self::IssuedToken { token_data }
    }

    /// Creates a certificate identity.
    pub fn x509(certificate: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self::X509 {
            certificate,
            private_key,
        }
    }
}

// Credentials never land in logs.
impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::UserName { username, .. } => f
                .debug_struct("UserName")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::IssuedToken { .. } => write!(f, "IssuedToken"),
            Self::X509 { .. } => write!(f, "X509"),
        }
    }
}

// =============================================================================
// IdentityProvider
// =============================================================================

/// Asynchronously supplies the identity to use for an endpoint.
pub type IdentityProvider = Arc<
    dyn Fn(&EndpointDescription) -> Pin<Box<dyn Future<Output = ClientResult<UserIdentity>> + Send>>
        + Send
        + Sync,
>;

/// Wraps an async closure as an [`IdentityProvider`].
pub fn identity_provider<F, Fut>(f: F) -> IdentityProvider
where
    F: Fn(EndpointDescription) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ClientResult<UserIdentity>> + Send + 'static,
{
    Arc::new(move |endpoint| Box::pin(f(endpoint.clone())))
}

/// An identity provider that always supplies [`UserIdentity::Anonymous`].
pub fn anonymous_provider() -> IdentityProvider {
    identity_provider(|_| async { Ok(UserIdentity::Anonymous) })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credentials() {
        let identity = UserIdentity::user_name("operator", "hunter2");
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("operator"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_provider_wrapper() {
        let provider = identity_provider(|endpoint: EndpointDescription| async move {
            if endpoint.endpoint_url.contains("secure") {
                Ok(UserIdentity::user_name("op", "pw"))
            } else {
                Ok(UserIdentity::Anonymous)
            }
        });

        let endpoint = EndpointDescription::new("opc.tcp://plain:4840");
        assert_eq!(provider(&endpoint).await.unwrap(), UserIdentity::Anonymous);

        let endpoint = EndpointDescription::new("opc.tcp://secure:4840");
        assert!(matches!(
            provider(&endpoint).await.unwrap(),
            UserIdentity::UserName { .. }
        ));
    }
}
