//!
//! The available-spectrum inquiry request document.
//!
//! Mirrors the AFC system-to-device interface JSON. Values are carried as
//! deserialized; semantic validation happens per inquiry in the engine so one
//! malformed inquiry cannot take down its siblings.
//!

use serde::{Deserialize, Serialize};

use crate::result::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumInquiryRequestDocument {
    pub version: String,
    pub available_spectrum_inquiry_requests: Vec<SpectrumInquiryRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumInquiryRequest {
    pub request_id: String,
    pub device_descriptor: DeviceDescriptor,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquired_frequency_range: Option<Vec<FrequencyRange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquired_channels: Option<Vec<InquiredChannels>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certification_id: Vec<CertificationId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ruleset_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationId {
    pub nra: String,
    pub id: String,
}

/// Device position: exactly one of the three uncertainty-region shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ellipse: Option<Ellipse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_polygon: Option<LinearPolygon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radial_polygon: Option<RadialPolygon>,
    pub elevation: Elevation,
    /// 0 = unknown, 1 = indoor, 2 = outdoor.
    #[serde(default)]
    pub indoor_deployment: u8,
}

impl Location {
    /// The single region shape, or an error when zero or several are set.
    pub fn shape(&self) -> Result<LocationShape<'_>> {
        match (
            &self.ellipse,
            &self.linear_polygon,
            &self.radial_polygon,
        ) {
            (Some(e), None, None) => Ok(LocationShape::Ellipse(e)),
            (None, Some(p), None) => Ok(LocationShape::LinearPolygon(p)),
            (None, None, Some(r)) => Ok(LocationShape::RadialPolygon(r)),
            _ => Err(Error::AmbiguousLocation),
        }
    }

    /// Whether the deployment is declared indoor. Unknown deployments get
    /// no building-entry credit.
    pub fn is_indoor(&self) -> bool {
        self.indoor_deployment == 1
    }
}

/// Borrowed view of the one shape a location carries.
#[derive(Clone, Copy, Debug)]
pub enum LocationShape<'a> {
    Ellipse(&'a Ellipse),
    LinearPolygon(&'a LinearPolygon),
    RadialPolygon(&'a RadialPolygon),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub center: GeoCoordinate,
    /// Semi-major axis in meters.
    pub major_axis: f64,
    /// Semi-minor axis in meters.
    pub minor_axis: f64,
    /// Major-axis bearing, degrees clockwise from true north.
    pub orientation: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearPolygon {
    pub outer_boundary: Vec<GeoCoordinate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadialPolygon {
    pub center: GeoCoordinate,
    pub outer_boundary: Vec<RadialVector>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadialVector {
    /// Bearing from true north in degrees.
    pub angle: f64,
    /// Distance from the center in meters.
    pub length: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elevation {
    /// Height in meters, referenced per `height_type`.
    pub height: f64,
    /// "AGL" or "AMSL".
    pub height_type: String,
    #[serde(default)]
    pub vertical_uncertainty: f64,
}

impl Elevation {
    /// The height as a typed reference.
    pub fn to_height(&self) -> Result<afc_geo::point::Height> {
        match self.height_type.as_str() {
            "AGL" => Ok(afc_geo::point::Height::Agl(self.height)),
            "AMSL" => Ok(afc_geo::point::Height::Amsl(self.height)),
            other => Err(Error::UnknownHeightType(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyRange {
    pub low_frequency: f64,
    pub high_frequency: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiredChannels {
    pub global_operating_class: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_cfi: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use float_cmp::assert_approx_eq;

    const REQUEST: &str = r#"{
        "version": "1.4",
        "availableSpectrumInquiryRequests": [{
            "requestId": "0",
            "deviceDescriptor": {
                "serialNumber": "ABCSN00",
                "certificationId": [{"nra": "FCC", "id": "EFGID000"}],
                "rulesetIds": ["US_47_CFR_PART_15_SUBPART_E"]
            },
            "location": {
                "ellipse": {
                    "center": {"latitude": 40.75924, "longitude": -73.97434},
                    "majorAxis": 100.0,
                    "minorAxis": 50.0,
                    "orientation": 45.0
                },
                "elevation": {"height": 129.0, "heightType": "AGL", "verticalUncertainty": 5.0},
                "indoorDeployment": 1
            },
            "inquiredFrequencyRange": [
                {"lowFrequency": 5925.0, "highFrequency": 6425.0},
                {"lowFrequency": 6525.0, "highFrequency": 6875.0}
            ],
            "inquiredChannels": [
                {"globalOperatingClass": 131},
                {"globalOperatingClass": 133, "channelCfi": [7, 23]}
            ]
        }]
    }"#;

    #[test]
    fn test_round_trip() {
        let doc: SpectrumInquiryRequestDocument = serde_json::from_str(REQUEST).unwrap();
        assert_eq!(doc.version, "1.4");
        let request = &doc.available_spectrum_inquiry_requests[0];
        assert_eq!(request.request_id, "0");
        assert!(request.location.is_indoor());

        let shape = request.location.shape().unwrap();
        match shape {
            LocationShape::Ellipse(e) => {
                assert_approx_eq!(f64, e.center.latitude, 40.75924);
                assert_approx_eq!(f64, e.major_axis, 100.0);
            }
            _ => panic!("expected ellipse"),
        }

        let height = request.location.elevation.to_height().unwrap();
        assert_eq!(height, afc_geo::point::Height::Agl(129.0));

        let channels = request.inquired_channels.as_ref().unwrap();
        assert_eq!(channels[1].channel_cfi.as_deref(), Some(&[7u8, 23][..]));

        // Round trip through serialization.
        let text = serde_json::to_string(&doc).unwrap();
        let doc2: SpectrumInquiryRequestDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(doc, doc2);
    }

    #[test]
    fn test_ambiguous_location_rejected() {
        let location = Location {
            ellipse: Some(Ellipse {
                center: GeoCoordinate {
                    latitude: 0.0,
                    longitude: 0.0,
                },
                major_axis: 1.0,
                minor_axis: 1.0,
                orientation: 0.0,
            }),
            linear_polygon: Some(LinearPolygon {
                outer_boundary: vec![],
            }),
            radial_polygon: None,
            elevation: Elevation {
                height: 3.0,
                height_type: "AGL".to_string(),
                vertical_uncertainty: 0.0,
            },
            indoor_deployment: 0,
        };
        assert!(matches!(location.shape(), Err(Error::AmbiguousLocation)));
    }

    #[test]
    fn test_unknown_height_type() {
        let elevation = Elevation {
            height: 3.0,
            height_type: "HAE".to_string(),
            vertical_uncertainty: 0.0,
        };
        assert!(matches!(
            elevation.to_height(),
            Err(Error::UnknownHeightType(_))
        ));
    }
}
