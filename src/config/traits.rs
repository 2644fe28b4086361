use crate::error::LabelcraftError;
use serde::{Deserialize, Serialize};

/// One `[section]` of the TOML configuration
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;

    fn validate(&self) -> Result<(), LabelcraftError>;

    /// Like [`validate`](Self::validate), with parameter names qualified as `section.key`.
    fn validate_section(&self) -> Result<(), LabelcraftError> {
        self.validate().map_err(|err| match err {
            LabelcraftError::InvalidParameter { parameter, reason } if !parameter.contains('.') => {
                LabelcraftError::InvalidParameter {
                    parameter: format!("{}.{}", Self::section_name(), parameter),
                    reason,
                }
            }
            other => other,
        })
    }
}
