use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::estimate::ErrorResponse;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EstimationError {
    #[error("surface must be a positive number of square meters, got {0}")]
    InvalidSurface(f64),
    #[error("unknown installation type \"{requested}\" (expected one of: {known})")]
    UnknownCategory { requested: String, known: String },
    #[error("client name is required for a full quote")]
    MissingClientName,
    #[error("field `{field}` is invalid: {reason}")]
    MalformedField { field: &'static str, reason: String },
    #[error("computation failed: {0}")]
    ComputationFault(&'static str),
}

impl EstimationError {
    /// Rejections caused by the request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ComputationFault(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSurface(_) => "invalid_surface",
            Self::UnknownCategory { .. } => "unknown_installation_type",
            Self::MissingClientName => "missing_client_name",
            Self::MalformedField { .. } => "malformed_field",
            Self::ComputationFault(_) => "computation_fault",
        }
    }
}

impl IntoResponse for EstimationError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::warn!(code = self.code(), "rejected request: {self}");
            let body = ErrorResponse {
                error: self.to_string(),
                code: self.code().to_string(),
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        } else {
            tracing::error!(code = self.code(), "estimation failed: {self}");
            let body = ErrorResponse {
                error: "internal computation error".to_string(),
                code: self.code().to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rejection_has_a_distinct_code() {
        let errors = [
            EstimationError::InvalidSurface(0.0),
            EstimationError::UnknownCategory {
                requested: "x".into(),
                known: "y".into(),
            },
            EstimationError::MissingClientName,
            EstimationError::MalformedField {
                field: "surface",
                reason: "missing".into(),
            },
            EstimationError::ComputationFault("total"),
        ];
        let mut codes: Vec<_> = errors.iter().map(EstimationError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn computation_fault_maps_to_server_error() {
        let resp = EstimationError::ComputationFault("total").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = EstimationError::MissingClientName.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
