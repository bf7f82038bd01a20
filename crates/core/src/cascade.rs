//! Model cascade and the (credential, model) attempt plan.
//!
//! The cascade is a fixed preference order over model identifiers. For one
//! user turn the orchestrator walks every credential and, inside each
//! credential, every model in cascade order. [`AttemptPlan`] makes that walk
//! an explicit iterator so the retry loop stays flat.

use crate::credential::Credential;

/// Built-in cascade, most preferred first.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];

/// Ordered list of candidate models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCascade {
    models: Vec<String>,
}

impl ModelCascade {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Pair every credential with every model, credential-major.
    pub fn plan(&self, credentials: Vec<Credential>) -> AttemptPlan {
        AttemptPlan {
            credentials,
            models: self.models.clone(),
            credential_idx: 0,
            model_idx: 0,
            yielded: 0,
        }
    }
}

impl Default for ModelCascade {
    fn default() -> Self {
        Self::new(DEFAULT_MODELS.iter().copied())
    }
}

/// One scheduled request slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub credential: Credential,
    pub model: String,
    /// 1-based count of attempts yielded so far, skipped slots excluded.
    pub number: usize,
}

/// Iterator over (credential, model) pairs.
///
/// After an attempt fails with an account-wide condition, call
/// [`AttemptPlan::abandon_credential`] and the next item will be the
/// following credential's first model.
#[derive(Debug, Clone)]
pub struct AttemptPlan {
    credentials: Vec<Credential>,
    models: Vec<String>,
    credential_idx: usize,
    model_idx: usize,
    yielded: usize,
}

impl AttemptPlan {
    /// Skip the remaining models of the credential last yielded.
    pub fn abandon_credential(&mut self) {
        if self.model_idx > 0 {
            self.credential_idx += 1;
            self.model_idx = 0;
        }
    }
}

impl Iterator for AttemptPlan {
    type Item = Attempt;

    fn next(&mut self) -> Option<Attempt> {
        if self.models.is_empty() {
            return None;
        }
        if self.model_idx >= self.models.len() {
            self.credential_idx += 1;
            self.model_idx = 0;
        }
        let credential = self.credentials.get(self.credential_idx)?.clone();
        let model = self.models[self.model_idx].clone();
        self.model_idx += 1;
        self.yielded += 1;
        Some(Attempt {
            credential,
            model,
            number: self.yielded,
        })
    }
}
