use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KnobError {
    #[error("Event target is required")]
    InvalidTarget,
    #[error("Degenerate range: min and max are both {0}")]
    ConfigurationDegenerate(f64),
    #[error("Malformed numeric input for {field}: {input:?}")]
    MalformedNumericInput { field: &'static str, input: String },
}
