use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use qrmenu_engine::{CheckoutError, MenuApiError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided. Send it as `Authorization: Bearer <token>`.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    Expired,
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => Self::BackendError(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::NotPermitted { .. } => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::IllegalTransition { .. } => Self::Conflict(e.to_string()),
            OrderFlowError::ActionUnavailable { .. } => Self::Conflict(e.to_string()),
            OrderFlowError::StatusConflict { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::DatabaseError(_) => Self::BackendError(e.to_string()),
            CheckoutError::NotAcceptingOrders(_) => Self::Conflict(e.to_string()),
            CheckoutError::Validation(_) |
            CheckoutError::EmptyCart |
            CheckoutError::InvalidTable(_) |
            CheckoutError::UnknownMenuItem(_) |
            CheckoutError::ItemUnavailable(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<MenuApiError> for ServerError {
    fn from(e: MenuApiError) -> Self {
        match e {
            MenuApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            MenuApiError::RestaurantNotFound(_) | MenuApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            MenuApiError::NoRestaurant | MenuApiError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            MenuApiError::Validation(_) | MenuApiError::SlugImmutable => Self::ValidationError(e.to_string()),
            MenuApiError::SlugTaken(_) => Self::Conflict(e.to_string()),
        }
    }
}
