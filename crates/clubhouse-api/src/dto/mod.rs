//! Request and response DTOs.

pub mod request;
pub mod response;

use validator::Validate;

use clubhouse_core::error::AppError;

/// Run `validator` checks, flattening the failures into one message.
pub fn validate<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        AppError::validation(messages.join("; "))
    })
}
