//!
//! The available-spectrum inquiry response document.
//!

use serde::{Deserialize, Serialize};

use crate::request::FrequencyRange;

/// Ruleset identifier granted by this engine.
pub const RULESET_US: &str = "US_47_CFR_PART_15_SUBPART_E";

/// Outcome classification of one inquiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    GeneralFailure,
    Success,
    VersionNotSupported,
    DeviceDisallowed,
    MissingParam,
    InvalidValue,
    UnexpectedParam,
    UnsupportedSpectrum,
}

impl ResponseCode {
    /// The numeric code carried on the wire.
    pub fn code(&self) -> i32 {
        match self {
            ResponseCode::GeneralFailure => -1,
            ResponseCode::Success => 0,
            ResponseCode::VersionNotSupported => 100,
            ResponseCode::DeviceDisallowed => 101,
            ResponseCode::MissingParam => 102,
            ResponseCode::InvalidValue => 103,
            ResponseCode::UnexpectedParam => 106,
            ResponseCode::UnsupportedSpectrum => 300,
        }
    }

    /// The standard short description.
    pub fn description(&self) -> &'static str {
        match self {
            ResponseCode::GeneralFailure => "GENERAL_FAILURE",
            ResponseCode::Success => "SUCCESS",
            ResponseCode::VersionNotSupported => "VERSION_NOT_SUPPORTED",
            ResponseCode::DeviceDisallowed => "DEVICE_DISALLOWED",
            ResponseCode::MissingParam => "MISSING_PARAM",
            ResponseCode::InvalidValue => "INVALID_VALUE",
            ResponseCode::UnexpectedParam => "UNEXPECTED_PARAM",
            ResponseCode::UnsupportedSpectrum => "UNSUPPORTED_SPECTRUM",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumInquiryResponseDocument {
    pub version: String,
    pub available_spectrum_inquiry_responses: Vec<SpectrumInquiryResponse>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumInquiryResponse {
    pub request_id: String,
    pub ruleset_id: String,
    pub response: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_frequency_info: Option<Vec<FrequencyInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_channel_info: Option<Vec<ChannelInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_expire_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatus {
    pub response_code: i32,
    pub short_description: String,
}

impl ResponseStatus {
    pub fn from_code(code: ResponseCode) -> Self {
        Self {
            response_code: code.code(),
            short_description: code.description().to_string(),
        }
    }

    /// A non-success status with a context-specific description.
    pub fn failure(code: ResponseCode, description: impl Into<String>) -> Self {
        Self {
            response_code: code.code(),
            short_description: description.into(),
        }
    }
}

/// Power spectral density availability over one frequency range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyInfo {
    pub frequency_range: FrequencyRange,
    pub max_psd: f64,
}

/// EIRP availability for the channels of one global operating class, as
/// parallel `channel_cfi`/`max_eirp` arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub global_operating_class: u8,
    pub channel_cfi: Vec<u8>,
    pub max_eirp: Vec<f64>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ResponseCode::Success.code(), 0);
        assert_eq!(ResponseCode::GeneralFailure.code(), -1);
        assert_eq!(ResponseCode::InvalidValue.code(), 103);
        assert_eq!(ResponseCode::UnsupportedSpectrum.code(), 300);
    }

    #[test]
    fn test_serialization_shape() {
        let response = SpectrumInquiryResponseDocument {
            version: "1.4".to_string(),
            available_spectrum_inquiry_responses: vec![SpectrumInquiryResponse {
                request_id: "0".to_string(),
                ruleset_id: RULESET_US.to_string(),
                response: ResponseStatus::from_code(ResponseCode::Success),
                available_frequency_info: Some(vec![FrequencyInfo {
                    frequency_range: FrequencyRange {
                        low_frequency: 5925.0,
                        high_frequency: 5945.0,
                    },
                    max_psd: 13.5,
                }]),
                available_channel_info: Some(vec![ChannelInfo {
                    global_operating_class: 133,
                    channel_cfi: vec![7, 23],
                    max_eirp: vec![36.0, 24.5],
                }]),
                availability_expire_time: Some("2024-01-02T03:04:05Z".to_string()),
            }],
        };

        let text = serde_json::to_string(&response).unwrap();
        assert!(text.contains("\"availableChannelInfo\""));
        assert!(text.contains("\"maxPsd\":13.5"));
        assert!(text.contains("\"responseCode\":0"));

        let parsed: SpectrumInquiryResponseDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, response);
    }
}
