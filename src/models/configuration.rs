use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parameters::Parameter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterChange {
    pub id: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationUpdateRequest {
    pub changes: Vec<ParameterChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationView {
    pub parameters: Vec<Parameter>,
    pub changed: Vec<String>,
}
