use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use vault_payment_engine::traits::{AccountApiError, PaymentGatewayError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment cannot be overridden. {0}")]
    ManualOverrideConflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ManualOverrideConflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::ManualOverrideForbidden(_) => Self::ManualOverrideConflict(e.to_string()),
            PaymentGatewayError::PaymentNotFound(_) |
            PaymentGatewayError::AccountNotFound(_) |
            PaymentGatewayError::AccountNotFoundForCustomer(_) |
            PaymentGatewayError::AccountNotFoundForEmail(_) => Self::NoRecordFound(e.to_string()),
            PaymentGatewayError::AmountInvalid(_) | PaymentGatewayError::RecordIncomplete(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            PaymentGatewayError::AccountError(inner) => inner.into(),
            PaymentGatewayError::DatabaseError(_) | PaymentGatewayError::UnsupportedAction(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::AccountNotFound(_) | AccountApiError::AccountNotFoundForCustomer(_) => {
                Self::NoRecordFound(e.to_string())
            },
            AccountApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
