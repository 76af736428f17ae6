use crate::consent::Subject;
use async_trait::async_trait;

/// Capability interface for resource-owner lookup.
///
/// The consent flow only ever asks two things of an identity backend: check
/// a credential pair and surface the current subject record. A real identity
/// provider can be substituted without touching the flow.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Check credentials; `None` on mismatch.
    async fn verify_credentials(&self, email: &str, password: &str) -> Option<Subject>;

    /// The subject record consents are resolved for.
    fn subject(&self) -> Subject;
}

/// Fixed single-user identity backend for demo deployments.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    subject: Subject,
    password: String,
}

impl FixedIdentity {
    pub fn new(subject: Subject, password: impl Into<String>) -> Self {
        Self {
            subject,
            password: password.into(),
        }
    }
}

impl Default for FixedIdentity {
    fn default() -> Self {
        Self {
            subject: Subject {
                subject: "user:12345:dandean".into(),
                email: "dan@acme.com".into(),
                email_verified: true,
                name: "Dan Dean".into(),
                nickname: "Danny".into(),
            },
            password: "secret".into(),
        }
    }
}

#[async_trait]
impl IdentityStore for FixedIdentity {
    async fn verify_credentials(&self, email: &str, password: &str) -> Option<Subject> {
        if email == self.subject.email && password == self.password {
            Some(self.subject.clone())
        } else {
            None
        }
    }

    fn subject(&self) -> Subject {
        self.subject.clone()
    }
}
