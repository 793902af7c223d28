//!
//! Contains the Result and Error types for the compute core.
//!
//! Errors split into two tiers: `Inquiry` wraps the recoverable class that
//! is reported in the per-request response while sibling inquiries continue;
//! every other variant is fatal to the whole request.
//!

use thiserror::Error as ThisError;

use afc_model::response::ResponseCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable, per-inquiry failures mapped to a response code.
#[derive(ThisError, Debug)]
pub enum InquiryError {
    #[error("location is not exactly one of ellipse, linearPolygon, radialPolygon")]
    BadLocation,
    #[error("unknown height type {0:?}")]
    BadHeightType(String),
    #[error("coordinates out of range: ({0}, {1})")]
    BadCoordinates(f64, f64),
    #[error("uncertainty region is zero sized")]
    ZeroSizedRegion,
    #[error("no channels or frequency ranges were inquired")]
    EmptyInquiry,
    #[error("inquired spectrum is outside the configured bands")]
    UnsupportedSpectrum,
    #[error("unknown global operating class {0}")]
    UnknownOperatingClass(u8),
}

impl InquiryError {
    /// The response code this failure maps to.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            InquiryError::BadLocation => ResponseCode::MissingParam,
            InquiryError::BadHeightType(_) => ResponseCode::InvalidValue,
            InquiryError::BadCoordinates(_, _) => ResponseCode::InvalidValue,
            InquiryError::ZeroSizedRegion => ResponseCode::InvalidValue,
            InquiryError::EmptyInquiry => ResponseCode::MissingParam,
            InquiryError::UnsupportedSpectrum => ResponseCode::UnsupportedSpectrum,
            InquiryError::UnknownOperatingClass(_) => ResponseCode::InvalidValue,
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("inquiry rejected")]
    Inquiry(#[from] InquiryError),
    #[error("region must be configured against terrain before use")]
    RegionNotConfigured,
    #[error("request wall-clock budget exhausted")]
    Timeout,
    #[error("request cancelled")]
    Cancelled,
    #[error("audit file IO error for {path}")]
    AuditIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("audit CSV error")]
    AuditCsv(#[from] csv::Error),
    #[error("unknown propagation model {0:?}")]
    UnknownPropagationModel(String),
    #[error(transparent)]
    Terrain(#[from] afc_terrain::result::Error),
    #[error(transparent)]
    Model(#[from] afc_model::result::Error),
    #[error(transparent)]
    Geo(#[from] afc_geo::result::Error),
}
