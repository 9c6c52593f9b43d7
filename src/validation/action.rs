//! Validated actions: every mutation entry point parses and validates its
//! submitted fields before any business logic runs.

use std::collections::BTreeMap;
use std::future::Future;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, Result};

/// The raw field set submitted to an action, e.g. a decoded form body.
pub type FormFields = BTreeMap<String, String>;

/// The outcome of an action: an error message or the handler's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionState<T> {
    /// The action was refused; `error` is shown to the user.
    Failed { error: String },
    /// The handler ran and produced this value.
    Done(T),
}

impl<T> ActionState<T> {
    /// A refused action with the given message.
    pub fn failed(error: impl Into<String>) -> Self {
        ActionState::Failed {
            error: error.into(),
        }
    }

    /// The error message, if the action was refused.
    pub fn error(&self) -> Option<&str> {
        match self {
            ActionState::Failed { error } => Some(error),
            ActionState::Done(_) => None,
        }
    }
}

impl<T: Serialize> IntoResponse for ActionState<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            ActionState::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ActionState::Done(_) => StatusCode::OK,
        };

        match sonic_rs::to_string(&self) {
            Ok(body) => (
                status,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(e) => AppError::Internal(format!("Action response serialization failed: {}", e))
                .into_response(),
        }
    }
}

/// Parses `fields` into `S` and runs its validation rules.
///
/// Only the first violation is reported. Submitted values are always
/// strings, so every field of `S` must deserialize from a string.
pub fn parse<S>(fields: &FormFields) -> std::result::Result<S, String>
where
    S: DeserializeOwned + garde::Validate,
    S::Context: Default,
{
    let encoded = sonic_rs::to_string(fields).map_err(|e| e.to_string())?;
    let parsed: S = sonic_rs::from_str(&encoded).map_err(|e| describe_parse_error(&e))?;

    if let Err(report) = parsed.validate() {
        let message = report
            .iter()
            .next()
            .map(|(path, error)| {
                let path = path.to_string();
                if path.is_empty() {
                    error.message().to_string()
                } else {
                    format!("{}: {}", path, error.message())
                }
            })
            .unwrap_or_else(|| "Invalid input".to_string());
        return Err(message);
    }

    Ok(parsed)
}

fn describe_parse_error(error: &sonic_rs::Error) -> String {
    let message = error.to_string();
    // sonic-rs appends the position and a source excerpt after the first line.
    let first_line = message.lines().next().unwrap_or("Invalid input");
    match first_line.find(" at line") {
        Some(idx) => first_line[..idx].to_string(),
        None => first_line.to_string(),
    }
}

/// Output types an action can be refused with.
pub trait Rejectable {
    /// The value returned when input fails validation.
    fn rejected(error: String) -> Self;
}

impl<T> Rejectable for ActionState<T> {
    fn rejected(error: String) -> Self {
        ActionState::Failed { error }
    }
}

impl<T> Rejectable for Result<ActionState<T>> {
    fn rejected(error: String) -> Self {
        Ok(ActionState::Failed { error })
    }
}

/// Runs `handler` on the validated form of `fields`.
///
/// On a validation failure the handler is never called and the first
/// violation is returned as `ActionState::Failed`. Otherwise the handler's
/// output is returned as-is.
pub async fn validated<S, R, F, Fut>(fields: FormFields, handler: F) -> R
where
    S: DeserializeOwned + garde::Validate,
    S::Context: Default,
    R: Rejectable,
    F: FnOnce(S, FormFields) -> Fut,
    Fut: Future<Output = R>,
{
    match parse::<S>(&fields) {
        Ok(data) => handler(data, fields).await,
        Err(error) => {
            tracing::debug!("Action input rejected: {}", error);
            R::rejected(error)
        }
    }
}

/// Like [`validated`], for actions that need the signed-in user.
///
/// `resolver` runs first. No user means the route was not gated properly, so
/// this returns `AppError::Unauthenticated` instead of a soft failure.
pub async fn validated_with_user<S, U, T, R, F, Fut>(
    fields: FormFields,
    resolver: R,
    handler: F,
) -> Result<ActionState<T>>
where
    S: DeserializeOwned + garde::Validate,
    S::Context: Default,
    R: Future<Output = Result<Option<U>>>,
    F: FnOnce(S, FormFields, U) -> Fut,
    Fut: Future<Output = Result<ActionState<T>>>,
{
    let user = resolver.await?.ok_or(AppError::Unauthenticated)?;

    match parse::<S>(&fields) {
        Ok(data) => handler(data, fields, user).await,
        Err(error) => {
            tracing::debug!("Action input rejected: {}", error);
            Ok(ActionState::failed(error))
        }
    }
}
