// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent user-facing messages.

/// Application error type shared by the store, controllers and CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Fallback shown when a failed pin toggle carries no message.
    pub const PIN_FAILED: &'static str = "Failed to update pin.";
    pub const COMPLETE_FAILED: &'static str = "Failed to mark completed.";
    pub const ODOMETER_FAILED: &'static str = "Failed to update odometer.";
    pub const SERVICE_SAVE_FAILED: &'static str = "Failed to save service.";
    pub const BIKE_SAVE_FAILED: &'static str = "Failed to save bike.";
    pub const LOAD_BIKE_FAILED: &'static str = "Failed to load bike.";
    pub const LOAD_BIKES_FAILED: &'static str = "Failed to load bikes.";
    pub const REFRESH_FAILED: &'static str = "Failed to refresh.";

    /// Message for display, falling back to `fallback` when the error has none.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }

    /// Local input errors never reach the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid.", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(" "))
    }
}

/// Result type alias for store and controller operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_uses_error_text() {
        let err = AppError::Backend("row level security violation".to_string());
        assert_eq!(
            err.user_message(AppError::PIN_FAILED),
            "row level security violation"
        );
    }

    #[test]
    fn test_user_message_falls_back_when_empty() {
        let err = AppError::Backend("   ".to_string());
        assert_eq!(err.user_message(AppError::PIN_FAILED), "Failed to update pin.");
    }

    #[test]
    fn test_is_validation() {
        assert!(AppError::Validation("bad".to_string()).is_validation());
        assert!(!AppError::Unauthorized.is_validation());
    }
}
