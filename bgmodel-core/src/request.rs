//! Validated observation parameters and query URL construction.

use chrono::{Datelike, NaiveDate};
use qtty::Micrometers;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::{
    coords::SkyCoord,
    error::RequestError,
    units::Wavelength,
};

/// Endpoint of the IRSA background model CGI.
pub const DEFAULT_BASE_URL: &str = "https://irsa.ipac.caltech.edu/cgi-bin/BackgroundModel/nph-bgmodel";

/// First and last year the model is tabulated for.
pub const MIN_YEAR: i32 = 2018;
pub const MAX_YEAR: i32 = 2029;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservingLocation {
    Earth,
    L2,
}

impl ObservingLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservingLocation::Earth => "Earth",
            ObservingLocation::L2 => "L2",
        }
    }

    /// Value of the `obslocin` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            ObservingLocation::Earth => "3",
            ObservingLocation::L2 => "1",
        }
    }

    pub const fn all() -> &'static [ObservingLocation] {
        &[ObservingLocation::Earth, ObservingLocation::L2]
    }
}

impl fmt::Display for ObservingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ObservingLocation {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Earth" => Ok(ObservingLocation::Earth),
            "L2" => Ok(ObservingLocation::L2),
            _ => Err(RequestError::InvalidInput(format!(
                "{value} is an incorrect input. Please choose 'Earth' or 'L2'"
            ))),
        }
    }
}

/// Zodiacal dust model used by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVersion {
    Wright,
    Kelsall,
}

impl ModelVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVersion::Wright => "Wright",
            ModelVersion::Kelsall => "Kelsall",
        }
    }

    /// Value of the `obsverin` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            ModelVersion::Wright => "0",
            ModelVersion::Kelsall => "3",
        }
    }

    pub const fn all() -> &'static [ModelVersion] {
        &[ModelVersion::Wright, ModelVersion::Kelsall]
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ModelVersion {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Wright" => Ok(ModelVersion::Wright),
            "Kelsall" => Ok(ModelVersion::Kelsall),
            _ => Err(RequestError::InvalidInput(format!(
                "{value} is an incorrect input. Please choose 'Wright' or 'Kelsall'"
            ))),
        }
    }
}

/// How the query parameters are laid out in the URL.
///
/// `Legacy` reproduces the historical client, which handed six values to seven
/// parameters: the `ido_viewin` slot received the model-version code, and neither
/// `obsverin` nor the median flag were ever sent. `Corrected` gives every
/// parameter its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLayout {
    #[default]
    Corrected,
    Legacy,
}

impl fmt::Display for ParameterLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterLayout::Corrected => "corrected",
            ParameterLayout::Legacy => "legacy",
        })
    }
}

/// Normalized inputs for one background model query.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRequest {
    coordinates: SkyCoord,
    locstr: String,
    wavelength: Micrometers,
    date: NaiveDate,
    year: i32,
    day: u32,
    location: ObservingLocation,
    version: ModelVersion,
    median: bool,
}

impl ObservationRequest {
    /// Validate and normalize the inputs.
    ///
    /// `observing_location` must be `"Earth"` or `"L2"` and `code_version`
    /// `"Wright"` or `"Kelsall"`. Dates outside 2018..=2029 are rejected.
    pub fn new(
        coordinates: SkyCoord,
        wavelength: impl Into<Wavelength>,
        date: NaiveDate,
        observing_location: &str,
        code_version: &str,
        median: bool,
    ) -> Result<Self, RequestError> {
        let wavelength = wavelength.into();
        let microns = wavelength.to_microns();
        if !microns.value().is_finite() || microns.value() <= 0.0 {
            return Err(RequestError::InvalidInput(format!(
                "wavelength must be positive, got {wavelength}"
            )));
        }

        let locstr = coordinates.to_icrs_string();

        let (year, day) = year_and_day(date);
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(RequestError::DateRange { year });
        }

        let location = ObservingLocation::try_from(observing_location)?;
        let version = ModelVersion::try_from(code_version)?;

        Ok(Self {
            coordinates,
            locstr,
            wavelength: microns,
            date,
            year,
            day,
            location,
            version,
            median,
        })
    }

    pub fn coordinates(&self) -> &SkyCoord {
        &self.coordinates
    }

    /// ICRS position in `hmsdms` form, before space stripping.
    pub fn locstr(&self) -> &str {
        &self.locstr
    }

    pub fn wavelength(&self) -> Micrometers {
        self.wavelength
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn location(&self) -> ObservingLocation {
        self.location
    }

    pub fn version(&self) -> ModelVersion {
        self.version
    }

    pub fn median(&self) -> bool {
        self.median
    }

    /// Value of the `ido_viewin` query parameter.
    pub fn view_code(&self) -> &'static str {
        if self.median { "1" } else { "0" }
    }

    /// Build the query URL. Deterministic in the request and layout; spaces are stripped.
    pub fn url(&self, base_url: &str, layout: ParameterLayout) -> String {
        let wavelength = format_float(self.wavelength.value());

        let url = match layout {
            ParameterLayout::Corrected => format!(
                "{base_url}?locstr={}&wavelength={}&year={}&day={}&obslocin={}&obsverin={}&ido_viewin={}",
                self.locstr,
                wavelength,
                self.year,
                self.day,
                self.location.code(),
                self.version.code(),
                self.view_code(),
            ),
            ParameterLayout::Legacy => format!(
                "{base_url}?locstr={}&wavelength={}&year={}&day={}&obslocin={}&ido_viewin={}",
                self.locstr,
                wavelength,
                self.year,
                self.day,
                self.location.code(),
                self.version.code(),
            ),
        };

        url.replace(' ', "")
    }
}

fn year_and_day(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.ordinal())
}

/// Whole numbers keep a trailing `.0`, the way the service has always received them.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
