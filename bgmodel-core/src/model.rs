use serde::{Deserialize, Serialize};

use crate::{error::FetchError, response::ServiceResponse, units::MjyPerSr};

/// Field names under `results/result/statistics`.
pub const ZODY: &str = "zody";
pub const ISM: &str = "ism";
pub const STARS: &str = "stars";
pub const CIB: &str = "cib";
pub const TOTBG: &str = "totbg";

/// Background components at the requested position, each in MJy/sr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundMeasurement {
    pub zodiacal_light: MjyPerSr,
    pub ism: MjyPerSr,
    pub stars: MjyPerSr,
    pub cib: MjyPerSr,
    pub total_background: MjyPerSr,
}

impl BackgroundMeasurement {
    /// Pull all five statistics out of a successful response.
    ///
    /// Any missing or non-numeric field fails the whole measurement.
    pub fn from_response(response: &ServiceResponse) -> Result<Self, FetchError> {
        response.ensure_ok()?;

        let field = |name: &str| response.statistic(name).map(MjyPerSr::new);

        Ok(Self {
            zodiacal_light: field(ZODY)?,
            ism: field(ISM)?,
            stars: field(STARS)?,
            cib: field(CIB)?,
            total_background: field(TOTBG)?,
        })
    }
}
