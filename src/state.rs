use serde::{Deserialize, Serialize};

/// The authorization-request variants offered by the relying party.
///
/// Each variant requests a different scope set and marks its outgoing state
/// value with a distinct prefix so the callback can tell the flows apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    /// Plain OpenID Connect login
    Default,
    /// Login plus profile and email claims
    Profile,
    /// Login requesting a refresh token (offline access)
    Refresh,
}

impl FlowVariant {
    /// State-value prefix for this variant. The default flow carries none.
    pub fn prefix(self) -> &'static str {
        match self {
            FlowVariant::Default => "",
            FlowVariant::Profile => "p-",
            FlowVariant::Refresh => "r-",
        }
    }

    fn from_prefix(prefix: Option<&str>) -> Option<FlowVariant> {
        match prefix {
            None => Some(FlowVariant::Default),
            Some("p-") => Some(FlowVariant::Profile),
            Some("r-") => Some(FlowVariant::Refresh),
            Some(_) => None,
        }
    }

    /// Scopes requested by this variant.
    pub fn scopes(self) -> &'static [&'static str] {
        match self {
            FlowVariant::Default => &["openid"],
            FlowVariant::Profile => &["openid", "email", "profile"],
            FlowVariant::Refresh => &["openid", "offline", "email", "profile"],
        }
    }

    /// Space-delimited scope parameter for the authorization endpoint.
    pub fn scope_param(self) -> String {
        self.scopes().join(" ")
    }
}

/// Result of checking a returned state value.
///
/// `valid` and `variant` are resolved independently: a recognized prefix with
/// a wrong secret yields `valid == false` with the variant still identified,
/// and an unknown prefix with the right secret yields `valid == true` with no
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateValidation {
    pub valid: bool,
    pub variant: Option<FlowVariant>,
}

/// Issues and checks the anti-forgery state values roundtripped through the
/// authorization redirect.
///
/// Every manager holds one random secret drawn at construction; all state
/// values it issues share that secret as suffix, distinguished only by the
/// variant prefix. The HTTP layer decides the isolation level by how many
/// managers it creates: one per process reproduces the original demo, one per
/// session gives per-session flow binding.
#[derive(Debug, Clone)]
pub struct StateTokenManager {
    secret: String,
}

impl StateTokenManager {
    /// Create a manager with a fresh random secret.
    pub fn new() -> Self {
        Self {
            secret: generate_secret(),
        }
    }

    /// Create a manager with a caller-supplied secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Build the state value for an outgoing authorization request.
    pub fn generate(&self, variant: FlowVariant) -> String {
        format!("{}{}", variant.prefix(), self.secret)
    }

    /// Check a state value returned on the callback.
    ///
    /// Returns `None` when the candidate does not match the expected shape
    /// (an optional `<word char>-` prefix followed by one or more word
    /// characters); callers must treat `None` as invalid with no variant.
    pub fn validate(&self, candidate: &str) -> Option<StateValidation> {
        let (prefix, secret) = split_state(candidate)?;
        Some(StateValidation {
            valid: secret == self.secret,
            variant: FlowVariant::from_prefix(prefix),
        })
    }
}

impl Default for StateTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// Pattern: ^(\w-)?(\w+)$
fn split_state(candidate: &str) -> Option<(Option<&str>, &str)> {
    let bytes = candidate.as_bytes();
    // A '-' at byte 1 implies an ASCII byte 0, so these slices stay on char
    // boundaries.
    let (prefix, rest) = if bytes.len() > 2 && bytes[1] == b'-' {
        (Some(&candidate[..2]), &candidate[2..])
    } else {
        (None, candidate)
    };

    if let Some(p) = prefix {
        if !p.chars().next().is_some_and(is_word) {
            return None;
        }
    }
    if rest.is_empty() || !rest.chars().all(is_word) {
        return None;
    }

    Some((prefix, rest))
}

fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.r#gen();
    hex::encode(bytes)
}
