use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, http::StatusCode, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::{Error, Res, types::AuthorizationCode};

/// Shared between the callback handler and the waiting authorization flow.
pub struct CallbackState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<Res<AuthorizationCode>>>>,
}

impl CallbackState {
    pub fn new(
        expected_state: impl Into<String>,
        sender: oneshot::Sender<Res<AuthorizationCode>>,
    ) -> Self {
        Self {
            expected_state: expected_state.into(),
            sender: Mutex::new(Some(sender)),
        }
    }
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<CallbackState>>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = callback_outcome(&params, &shared_state.expected_state);

    let response = match &outcome {
        Ok(_) => (
            StatusCode::OK,
            Html("<h2>Successfully authorized.</h2><p>You can go back to your terminal now.</p>"),
        ),
        Err(Error::AuthorizationDenied(_)) => (
            StatusCode::FORBIDDEN,
            Html("<h4>Authorization was denied.</h4>"),
        ),
        Err(Error::StateMismatch) => (
            StatusCode::BAD_REQUEST,
            Html("<h4>Authorization state did not match.</h4>"),
        ),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Html("<h4>Couldn't get code from request URI.</h4>"),
        ),
    };

    // Only the first callback completes the flow.
    let Some(sender) = shared_state.sender.lock().await.take() else {
        return (
            StatusCode::CONFLICT,
            Html("<h4>Authorization already completed.</h4>"),
        );
    };

    match &outcome {
        Ok(_) => tracing::debug!("authorization code received"),
        Err(e) => tracing::debug!(error = %e, "authorization callback rejected"),
    }

    if sender.send(outcome).is_err() {
        tracing::debug!("authorization flow no longer waiting");
    }
    response
}

/// Interprets the redirect query: a provider error wins, then a missing
/// code, then a state mismatch.
pub fn callback_outcome(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> Res<AuthorizationCode> {
    if let Some(reason) = params.get("error") {
        return Err(Error::AuthorizationDenied(reason.clone()));
    }

    let code = match params.get("code") {
        Some(code) if !code.is_empty() => code,
        _ => return Err(Error::MissingCode),
    };

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(Error::StateMismatch);
    }

    Ok(AuthorizationCode(code.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn code_with_matching_state() {
        let outcome = callback_outcome(&params(&[("code", "XYZ"), ("state", "s1")]), "s1");
        assert_eq!(outcome.unwrap(), AuthorizationCode("XYZ".into()));
    }

    #[test]
    fn missing_code() {
        let outcome = callback_outcome(&params(&[("state", "s1")]), "s1");
        assert!(matches!(outcome, Err(Error::MissingCode)));

        let outcome = callback_outcome(&params(&[("code", ""), ("state", "s1")]), "s1");
        assert!(matches!(outcome, Err(Error::MissingCode)));
    }

    #[test]
    fn wrong_or_absent_state() {
        let outcome = callback_outcome(&params(&[("code", "XYZ"), ("state", "other")]), "s1");
        assert!(matches!(outcome, Err(Error::StateMismatch)));

        let outcome = callback_outcome(&params(&[("code", "XYZ")]), "s1");
        assert!(matches!(outcome, Err(Error::StateMismatch)));
    }

    #[test]
    fn provider_error_is_denial() {
        let outcome = callback_outcome(
            &params(&[("error", "access_denied"), ("state", "s1")]),
            "s1",
        );
        assert!(matches!(outcome, Err(Error::AuthorizationDenied(r)) if r == "access_denied"));
    }
}
