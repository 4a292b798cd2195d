use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid vector '{0}'. Expected three comma-separated numbers (e.g., '1.0,0,-2.5').")]
    InvalidVectorFormat(String),

    #[error("Component '{component}' of vector '{input}' is not a number.")]
    InvalidComponent { component: String, input: String },

    #[error("Component '{component}' of vector '{input}' is not finite.")]
    NonFiniteComponent { component: String, input: String },
}

/// Parses a displacement given as `x,y,z`. Whitespace around components is
/// ignored.
pub fn parse_vector(input: &str) -> Result<Vector3<f64>, ParseError> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [x, y, z] = parts[..] else {
        return Err(ParseError::InvalidVectorFormat(input.to_string()));
    };

    let component = |text: &str| -> Result<f64, ParseError> {
        let value: f64 = text.parse().map_err(|_| ParseError::InvalidComponent {
            component: text.to_string(),
            input: input.to_string(),
        })?;
        if !value.is_finite() {
            return Err(ParseError::NonFiniteComponent {
                component: text.to_string(),
                input: input.to_string(),
            });
        }
        Ok(value)
    };

    Ok(Vector3::new(component(x)?, component(y)?, component(z)?))
}
