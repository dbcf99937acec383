use serde::Deserialize;
use thiserror::Error;

/// One field-level message from a structured validation failure.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("cart is empty")]
    EmptyCart,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("a message is already being sent")]
    SendInFlight,

    #[error("{0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// Message suitable for a toast or inline error panel.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid")),
                })
            })
            .collect();
        ClientError::Validation(fields)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ClientResult<T> = Result<T, ClientError>;
