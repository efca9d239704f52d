//! Error macros for promptest

/// Return an invalid value error
#[macro_export]
macro_rules! bail_invalid {
    ($context:expr, $value:expr) => {
        return Err($crate::error::PromptestError::invalid_value($context, $value))
    };
}

/// Return a template placeholder error
#[macro_export]
macro_rules! bail_template {
    ($name:expr, $problem:expr) => {
        return Err($crate::error::PromptestError::template_variable(
            $name, $problem,
        ))
    };
}
