use thiserror::Error;

pub type YieldResult<T> = Result<T, YieldError>;

#[derive(Error, Debug)]
pub enum YieldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid formula template '{template}': {message}")]
    Pattern { template: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Formula evaluation error: {0}")]
    Eval(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Division by zero: {quantity} is 0")]
    DivisionByZero { quantity: String },
}

impl YieldError {
    pub fn division_by_zero(quantity: impl Into<String>) -> Self {
        YieldError::DivisionByZero {
            quantity: quantity.into(),
        }
    }
}
