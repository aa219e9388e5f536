//! # Query Errors
//!
//! Query construction fails in two tiers:
//!
//! - **Resolution problems** (unknown fields, malformed paths, keywords that do not
//!   convert to a number) never surface here. They are logged and the field simply
//!   contributes no predicate or ordering clause.
//! - **Conversion failures** on enum keywords and **database errors** are returned as
//!   [`QueryError`] from the `try_*` entry points. The fail-soft entry points log them
//!   and hand back an empty [`QueryResults`](crate::QueryResults) instead.
//!
//! When surfaced through axum, database details are logged but never sent to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Failure raised while augmenting or executing a query.
#[derive(Debug)]
pub enum QueryError {
    /// 400 Bad Request - a keyword is not a member of the declared enum
    InvalidEnumValue {
        /// Search field the keyword was given for
        field: String,
        /// Offending keyword
        value: String,
        /// Name of the enum the keyword was checked against
        enum_name: String,
    },

    /// 400 Bad Request - an enum search was requested on a field without an enum descriptor
    UndeclaredEnum {
        /// Search field with no enum descriptor
        field: String,
    },

    /// 500 Internal Server Error - database error (details logged, not exposed)
    Database(DbErr),
}

impl QueryError {
    // ============================================================================
    // Constructors
    // ============================================================================

    /// Create an invalid enum keyword error
    pub fn invalid_enum_value(
        field: impl Into<String>,
        value: impl Into<String>,
        enum_name: impl Into<String>,
    ) -> Self {
        Self::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
            enum_name: enum_name.into(),
        }
    }

    /// Create an error for an enum search on a field with no enum descriptor
    pub fn undeclared_enum(field: impl Into<String>) -> Self {
        Self::UndeclaredEnum {
            field: field.into(),
        }
    }

    // ============================================================================
    // Response mapping
    // ============================================================================

    /// HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEnumValue { .. } | Self::UndeclaredEnum { .. } => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message with internal details stripped
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEnumValue {
                field,
                value,
                enum_name,
            } => format!("'{value}' is not a valid {enum_name} value for '{field}'"),
            Self::UndeclaredEnum { field } => {
                format!("Field '{field}' does not support enum search")
            }
            Self::Database(_) => "A database error occurred".to_string(),
        }
    }

    /// Log internal details (called automatically by `into_response`)
    fn log_internal(&self) {
        match self {
            Self::Database(internal) => {
                tracing::error!(error = %internal, "Database error while building query results");
            }
            Self::InvalidEnumValue { field, value, .. } => {
                tracing::warn!(field = %field, value = %value, "Rejected enum search keyword");
            }
            Self::UndeclaredEnum { field } => {
                tracing::warn!(field = %field, "Enum search on field without enum descriptor");
            }
        }
    }
}

/// JSON body returned to clients
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnumValue {
                field,
                value,
                enum_name,
            } => write!(f, "Invalid {enum_name} value '{value}' for field '{field}'"),
            Self::UndeclaredEnum { field } => {
                write!(f, "Enum search requested on field '{field}' without an enum descriptor")
            }
            Self::Database(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbErr> for QueryError {
    fn from(err: DbErr) -> Self {
        Self::Database(err)
    }
}
