//! Wavelength and surface-brightness quantities.
//!
//! Lengths are `qtty` quantities. Callers name the unit at runtime (CLI flag,
//! config), so [`Wavelength`] carries one of the supported typed lengths and
//! normalizes it to [`Micrometers`] for the query.

use qtty::{
    Dimension, Length, LengthUnit, Micrometer, Micrometers, Millimeters, Meters, Nanometers,
    Quantity, Unit,
};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::RequestError;

/// Dimension tag for surface brightness.
pub enum SurfaceBrightness {}
impl Dimension for SurfaceBrightness {}

/// Megajansky per steradian.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct MegajanskyPerSteradian;

impl Unit for MegajanskyPerSteradian {
    const RATIO: f64 = 1.0;
    type Dim = SurfaceBrightness;
    const SYMBOL: &'static str = "MJy/sr";
}

/// A surface brightness in MJy/sr.
pub type MjyPerSr = Quantity<MegajanskyPerSteradian>;

/// Ångström, 1e-10 m.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Angstrom;

impl Unit for Angstrom {
    const RATIO: f64 = 1e-10;
    type Dim = Length;
    const SYMBOL: &'static str = "AA";
}

pub type Angstroms = Quantity<Angstrom>;

/// Length unit a wavelength may be given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavelengthUnit {
    #[default]
    Micron,
    Nanometer,
    Angstrom,
    Millimeter,
    Meter,
}

impl WavelengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WavelengthUnit::Micron => "micron",
            WavelengthUnit::Nanometer => "nm",
            WavelengthUnit::Angstrom => "angstrom",
            WavelengthUnit::Millimeter => "mm",
            WavelengthUnit::Meter => "m",
        }
    }
}

impl fmt::Display for WavelengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WavelengthUnit {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "micron" | "um" | "µm" => Ok(WavelengthUnit::Micron),
            "nm" | "nanometer" => Ok(WavelengthUnit::Nanometer),
            "angstrom" | "AA" | "Å" => Ok(WavelengthUnit::Angstrom),
            "mm" | "millimeter" => Ok(WavelengthUnit::Millimeter),
            "m" | "meter" => Ok(WavelengthUnit::Meter),
            other => Err(RequestError::InvalidInput(format!(
                "'{other}' is not a recognised wavelength unit. \
                 Supported units: micron, nm, angstrom, mm, m."
            ))),
        }
    }
}

/// A wavelength in one of the supported length units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wavelength {
    Micrometers(Micrometers),
    Nanometers(Nanometers),
    Angstroms(Angstroms),
    Millimeters(Millimeters),
    Meters(Meters),
}

impl Wavelength {
    pub fn new(value: f64, unit: WavelengthUnit) -> Self {
        match unit {
            WavelengthUnit::Micron => Self::Micrometers(Micrometers::new(value)),
            WavelengthUnit::Nanometer => Self::Nanometers(Nanometers::new(value)),
            WavelengthUnit::Angstrom => Self::Angstroms(Angstroms::new(value)),
            WavelengthUnit::Millimeter => Self::Millimeters(Millimeters::new(value)),
            WavelengthUnit::Meter => Self::Meters(Meters::new(value)),
        }
    }

    pub fn unit(&self) -> WavelengthUnit {
        match self {
            Self::Micrometers(_) => WavelengthUnit::Micron,
            Self::Nanometers(_) => WavelengthUnit::Nanometer,
            Self::Angstroms(_) => WavelengthUnit::Angstrom,
            Self::Millimeters(_) => WavelengthUnit::Millimeter,
            Self::Meters(_) => WavelengthUnit::Meter,
        }
    }

    /// Value in [`Wavelength::unit`].
    pub fn value(&self) -> f64 {
        match self {
            Self::Micrometers(q) => q.value(),
            Self::Nanometers(q) => q.value(),
            Self::Angstroms(q) => q.value(),
            Self::Millimeters(q) => q.value(),
            Self::Meters(q) => q.value(),
        }
    }

    pub fn to_microns(&self) -> Micrometers {
        match *self {
            Self::Micrometers(q) => q,
            Self::Nanometers(q) => to_microns(q),
            Self::Angstroms(q) => to_microns(q),
            Self::Millimeters(q) => to_microns(q),
            Self::Meters(q) => to_microns(q),
        }
    }
}

impl From<Micrometers> for Wavelength {
    fn from(q: Micrometers) -> Self {
        Self::Micrometers(q)
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value(), self.unit())
    }
}

/// Convert a length to micrometres.
///
/// Decimal SI units differ from the micrometre by a power of ten. Scaling by that
/// power directly keeps e.g. 0.5 mm at exactly 500 µm, where the ratio of the
/// two `RATIO` constants would not. Other units go through `to::<Micrometer>()`.
pub fn to_microns<U: LengthUnit>(q: Quantity<U>) -> Micrometers {
    let exponent = (U::RATIO / Micrometer::RATIO).log10();
    let rounded = exponent.round();
    if (exponent - rounded).abs() > 1e-9 {
        return q.to::<Micrometer>();
    }

    let factor = 10f64.powi(rounded.abs() as i32);
    if rounded >= 0.0 {
        Micrometers::new(q.value() * factor)
    } else {
        Micrometers::new(q.value() / factor)
    }
}
