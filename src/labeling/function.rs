use super::view::WindowView;
use crate::error::{LabelcraftError, Result};
use crate::types::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Named parameters forwarded verbatim to the labeling function.
pub type Params = BTreeMap<String, Value>;

/// A label value plus optional auxiliary columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelOutput {
    pub value: Value,
    pub extras: Vec<(String, Value)>,
}

impl LabelOutput {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            extras: Vec::new(),
        }
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.push((name.into(), value.into()));
        self
    }
}

macro_rules! label_output_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LabelOutput {
                fn from(value: $ty) -> Self {
                    LabelOutput::new(value)
                }
            }
        )*
    };
}

label_output_from!(Value, f64, i64, usize, bool, String, &str, Option<f64>, Option<i64>);

/// Strategy computing one label from one window.
///
/// Implementations must be pure: the same window and parameters give the same
/// output. `Send + Sync` lets the engine label disjoint entities in parallel.
pub trait LabelingFunction: Send + Sync {
    fn name(&self) -> &str;

    /// Parameter names the function understands; `None` accepts anything.
    fn accepted_params(&self) -> Option<&[String]> {
        None
    }

    fn required_params(&self) -> &[String] {
        &[]
    }

    fn evaluate(&self, window: &WindowView<'_>, params: &Params) -> anyhow::Result<LabelOutput>;
}

type LabelFn = dyn Fn(&WindowView<'_>, &Params) -> anyhow::Result<LabelOutput> + Send + Sync;

/// Closure-backed [`LabelingFunction`].
#[derive(Clone)]
pub struct LabelFunction {
    name: String,
    accepted: Option<Vec<String>>,
    required: Vec<String>,
    func: Arc<LabelFn>,
}

impl LabelFunction {
    pub fn new<F, T>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&WindowView<'_>, &Params) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Into<LabelOutput>,
    {
        Self {
            name: name.into(),
            accepted: None,
            required: Vec::new(),
            func: Arc::new(move |window: &WindowView<'_>, params: &Params| {
                func(window, params).map(Into::into)
            }),
        }
    }

    /// Restrict the accepted parameter names.
    pub fn accepts<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.accepted = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Parameters that must be supplied; they are implicitly accepted.
    pub fn requires<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.required = names.into_iter().map(Into::into).collect();
        if let Some(accepted) = self.accepted.as_mut() {
            for name in &self.required {
                if !accepted.contains(name) {
                    accepted.push(name.clone());
                }
            }
        }
        self
    }
}

impl fmt::Debug for LabelFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFunction")
            .field("name", &self.name)
            .field("accepted", &self.accepted)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl LabelingFunction for LabelFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepted_params(&self) -> Option<&[String]> {
        self.accepted.as_deref()
    }

    fn required_params(&self) -> &[String] {
        &self.required
    }

    fn evaluate(&self, window: &WindowView<'_>, params: &Params) -> anyhow::Result<LabelOutput> {
        (self.func)(window, params)
    }
}

/// Check supplied parameters against the function's declared signature.
pub fn validate_params(function: &dyn LabelingFunction, params: &Params) -> Result<()> {
    if function.name().trim().is_empty() {
        return Err(LabelcraftError::Configuration(
            "Labeling function must have a non-empty name".to_string(),
        ));
    }

    let missing: Vec<&String> = function
        .required_params()
        .iter()
        .filter(|name| !params.contains_key(name.as_str()))
        .collect();
    if !missing.is_empty() {
        return Err(LabelcraftError::SignatureMismatch {
            function: function.name().to_string(),
            reason: format!("missing required parameters {:?}", missing),
        });
    }

    if let Some(accepted) = function.accepted_params() {
        let unknown: Vec<&String> = params
            .keys()
            .filter(|name| {
                !accepted.contains(name) && !function.required_params().contains(name)
            })
            .collect();
        if !unknown.is_empty() {
            return Err(LabelcraftError::SignatureMismatch {
                function: function.name().to_string(),
                reason: format!(
                    "unexpected parameters {:?} (accepted: {:?})",
                    unknown, accepted
                ),
            });
        }
    }

    Ok(())
}
