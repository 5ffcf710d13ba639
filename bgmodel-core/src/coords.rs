//! Sky coordinates and their ICRS string form.

use qtty::{Degree, Degrees, HourAngle, HourAngles, Radians};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::RequestError;

/// Rotation from ICRS to Galactic (Hipparcos definition). Its transpose maps back.
const ICRS_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.054_875_560_416_215_4, -0.873_437_090_234_885_0, -0.483_835_015_548_713_2],
    [0.494_109_427_875_583_7, -0.444_829_629_960_011_2, 0.746_982_244_497_218_9],
    [-0.867_666_149_019_004_7, -0.198_076_373_431_201_5, 0.455_983_776_175_066_9],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Icrs,
    Galactic,
}

impl Frame {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frame::Icrs => "icrs",
            Frame::Galactic => "galactic",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Frame {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "icrs" => Ok(Frame::Icrs),
            "galactic" => Ok(Frame::Galactic),
            _ => Err(RequestError::InvalidInput(format!(
                "'{value}' is not a supported frame. Please choose 'icrs' or 'galactic'"
            ))),
        }
    }
}

/// A position on the sky in a given frame.
///
/// For [`Frame::Icrs`] `lon`/`lat` are right ascension and declination, for
/// [`Frame::Galactic`] they are galactic longitude and latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    lon: Degrees,
    lat: Degrees,
    frame: Frame,
}

impl SkyCoord {
    /// Validate the latitude and wrap the longitude into [0, 360).
    pub fn new(lon: Degrees, lat: Degrees, frame: Frame) -> Result<Self, RequestError> {
        let (l, b) = (lon.value(), lat.value());
        if !l.is_finite() || !b.is_finite() || !(-90.0..=90.0).contains(&b) {
            return Err(RequestError::InvalidInput(format!(
                "({l}, {b}) is not a valid {frame} coordinate"
            )));
        }

        Ok(Self { lon: lon.wrap_pos(), lat, frame })
    }

    pub fn from_degrees(lon: f64, lat: f64, frame: Frame) -> Result<Self, RequestError> {
        Self::new(Degrees::new(lon), Degrees::new(lat), frame)
    }

    /// Parse a longitude/latitude pair.
    ///
    /// Accepts decimal degrees (`"9.816"`), unit-marked sexagesimal
    /// (`"0h39m15.9s"`, `"-0d53m17.016s"`) and colon-separated sexagesimal
    /// (`"00:39:15.9"`). In ICRS a sexagesimal longitude is read as hours
    /// unless it is marked with `d`.
    pub fn parse(lon: &str, lat: &str, frame: Frame) -> Result<Self, RequestError> {
        let invalid = || {
            RequestError::InvalidInput(format!(
                "'{lon} {lat}' is not a recognised {frame} sky coordinate"
            ))
        };

        let lon_parts = Sexagesimal::parse(lon).ok_or_else(invalid)?;
        let lat_parts = Sexagesimal::parse(lat).ok_or_else(invalid)?;

        if lat_parts.hours {
            return Err(invalid());
        }

        let lon_deg = match frame {
            Frame::Icrs if lon_parts.hours || (lon_parts.components > 1 && !lon_parts.degrees) => {
                HourAngles::new(lon_parts.value).to::<Degree>()
            }
            Frame::Galactic if lon_parts.hours => return Err(invalid()),
            _ => Degrees::new(lon_parts.value),
        };

        if !(0.0..360.0).contains(&lon_deg.value()) {
            return Err(invalid());
        }

        Self::new(lon_deg, Degrees::new(lat_parts.value), frame).map_err(|_| invalid())
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Right ascension or galactic longitude.
    pub fn lon(&self) -> Degrees {
        self.lon
    }

    /// Declination or galactic latitude.
    pub fn lat(&self) -> Degrees {
        self.lat
    }

    pub fn transform_to_icrs(&self) -> SkyCoord {
        match self.frame {
            Frame::Icrs => *self,
            Frame::Galactic => {
                let g = unit_vector(self.lon, self.lat);
                let mut r = [0.0; 3];
                for (i, out) in r.iter_mut().enumerate() {
                    *out = (0..3).map(|j| ICRS_TO_GALACTIC[j][i] * g[j]).sum();
                }

                let ra = Radians::new(r[1].atan2(r[0])).to::<Degree>().wrap_pos();
                let dec = Radians::new(r[2].clamp(-1.0, 1.0).asin()).to::<Degree>();

                SkyCoord { lon: ra, lat: dec, frame: Frame::Icrs }
            }
        }
    }

    /// ICRS position as `HHhMMmSS.SSSs ±DDdMMmSS.SSSs`.
    pub fn to_icrs_string(&self) -> String {
        let icrs = self.transform_to_icrs();

        let ra_hours = icrs.lon.to::<HourAngle>().value();
        let ra_ms = (ra_hours * 3_600_000.0).round() as u64 % (24 * 3_600_000);
        let (h, m, s, ms) = split_millis(ra_ms);

        let dec = icrs.lat.value();
        let sign = if dec < 0.0 { '-' } else { '+' };
        let dec_ms = (dec.abs() * 3_600_000.0).round() as u64;
        let (d, am, asec, ams) = split_millis(dec_ms);

        format!("{h:02}h{m:02}m{s:02}.{ms:03}s {sign}{d:02}d{am:02}m{asec:02}.{ams:03}s")
    }
}

impl fmt::Display for SkyCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.6}, {:.6})", self.frame, self.lon.value(), self.lat.value())
    }
}

fn unit_vector(lon: Degrees, lat: Degrees) -> [f64; 3] {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

fn split_millis(total: u64) -> (u64, u64, u64, u64) {
    let ms = total % 1000;
    let secs = total / 1000;
    (secs / 3600, (secs / 60) % 60, secs % 60, ms)
}

/// Parsed angle in its leading unit (hours or degrees), with how it was written.
struct Sexagesimal {
    value: f64,
    components: usize,
    hours: bool,
    degrees: bool,
}

impl Sexagesimal {
    fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        // Each component with the marker that closed it, if any.
        let mut parts: Vec<(f64, Option<char>)> = Vec::new();
        let mut number = String::new();
        for c in body.chars().chain([' ']) {
            match c {
                'h' | 'd' | '°' | 'm' | 's' | '\'' | '"' => {
                    if number.is_empty() {
                        return None;
                    }
                    parts.push((number.parse().ok()?, Some(c)));
                    number.clear();
                }
                c if c == ':' || c.is_whitespace() => {
                    if !number.is_empty() {
                        parts.push((number.parse().ok()?, None));
                        number.clear();
                    }
                }
                other => number.push(other),
            }
        }

        if parts.is_empty() || parts.len() > 3 {
            return None;
        }

        for (i, (part, marker)) in parts.iter().enumerate() {
            let marker_fits = match (i, marker) {
                (_, None) => true,
                (0, Some('h' | 'd' | '°')) => true,
                (1, Some('m' | '\'')) => true,
                (2, Some('s' | '"')) => true,
                _ => false,
            };
            if !marker_fits {
                return None;
            }

            // Minutes and seconds must be in range and only the last component may be fractional.
            if !part.is_finite() || *part < 0.0 {
                return None;
            }
            if i > 0 && *part >= 60.0 {
                return None;
            }
            if i + 1 < parts.len() && part.fract() != 0.0 {
                return None;
            }
        }

        let magnitude = parts
            .iter()
            .zip([1.0, 60.0, 3600.0])
            .map(|((part, _), div)| part / div)
            .sum::<f64>();

        let lead = parts[0].1;
        Some(Self {
            value: if negative { -magnitude } else { magnitude },
            components: parts.len(),
            hours: lead == Some('h'),
            degrees: matches!(lead, Some('d' | '°')),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_dms_round_trips_to_icrs_string() {
        let c = SkyCoord::parse("0h39m15.9s", "0d53m17.016s", Frame::Icrs).unwrap();
        assert_eq!(c.to_icrs_string(), "00h39m15.900s +00d53m17.016s");
    }

    #[test]
    fn colon_form_is_hours_for_ra() {
        let c = SkyCoord::parse("12:30:00", "-45:15:30.5", Frame::Icrs).unwrap();
        assert!((c.lon().value() - 187.5).abs() < 1e-9);
        assert_eq!(c.to_icrs_string(), "12h30m00.000s -45d15m30.500s");
    }

    #[test]
    fn decimal_degrees() {
        let c = SkyCoord::parse("150.0", "2.5", Frame::Icrs).unwrap();
        assert_eq!(c.to_icrs_string(), "10h00m00.000s +02d30m00.000s");
    }

    #[test]
    fn galactic_centre_transforms_to_sagittarius() {
        let c = SkyCoord::parse("0", "0", Frame::Galactic).unwrap().transform_to_icrs();
        assert_eq!(c.frame(), Frame::Icrs);
        assert!((c.lon().value() - 266.405).abs() < 1e-3);
        assert!((c.lat().value() + 28.936).abs() < 1e-3);
    }

    #[test]
    fn rejects_garbage_and_out_of_range() {
        assert!(SkyCoord::parse("not", "a coordinate", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("10", "95", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("10h61m", "0", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("10", "5h", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("1h", "0", Frame::Galactic).is_err());
    }

    #[test]
    fn leading_minute_or_second_marker_is_rejected() {
        assert!(SkyCoord::parse("10", "30m", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("45s", "0", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("10", "-30'", Frame::Icrs).is_err());
        assert!(SkyCoord::parse("10", "30\"", Frame::Galactic).is_err());
        assert!(SkyCoord::parse("10h30d", "0", Frame::Icrs).is_err());

        let c = SkyCoord::parse("10", "-0d30'", Frame::Icrs).unwrap();
        assert_eq!(c.lat(), Degrees::new(-0.5));
    }

    #[test]
    fn longitude_wraps_into_one_turn() {
        let c = SkyCoord::from_degrees(-90.0, 10.0, Frame::Galactic).unwrap();
        assert_eq!(c.lon(), Degrees::new(270.0));
    }

    #[test]
    fn seconds_rounding_carries_into_minutes() {
        let c = SkyCoord::from_degrees(15.0 * (59.0 / 60.0 + 59.9999 / 3600.0), 0.0, Frame::Icrs)
            .unwrap();
        assert_eq!(c.to_icrs_string(), "01h00m00.000s +00d00m00.000s");
    }
}
