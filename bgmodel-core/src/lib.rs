//! Core library for the `bgmodel` CLI.
//!
//! Queries the IRSA infrared background model for one sky position, date and
//! wavelength, and returns the zodiacal light, interstellar medium, stellar,
//! cosmic infrared background and total background in MJy/sr.
//!
//! This crate defines:
//! - Sky coordinates and `qtty`-based wavelength and brightness quantities
//! - Request validation and query URL construction
//! - XML response decoding and measurement extraction
//! - Configuration handling
//!
//! ```rust,no_run
//! use bgmodel_core::{BackgroundModel, Config, Frame, HttpTransport, ObservationRequest, SkyCoord};
//! use chrono::NaiveDate;
//! use qtty::Micrometers;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let request = ObservationRequest::new(
//!     SkyCoord::parse("0h39m15.9s", "0d53m17.016s", Frame::Icrs)?,
//!     Micrometers::new(200.0),
//!     NaiveDate::from_ymd_opt(2019, 4, 13).unwrap(),
//!     "L2",
//!     "Wright",
//!     true,
//! )?;
//!
//! let config = Config::default();
//! let transport = HttpTransport::from_config(&config.service)?;
//! let model = BackgroundModel::query(&transport, request, &config.service).await;
//! println!("{:?}", model.zodiacal_light());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod coords;
pub mod error;
pub mod model;
pub mod request;
pub mod response;
pub mod units;

pub use client::{BackgroundModel, HttpTransport, Transport};
pub use config::{Config, QueryDefaults, ServiceConfig};
pub use coords::{Frame, SkyCoord};
pub use error::{FetchError, RequestError};
pub use model::BackgroundMeasurement;
pub use request::{ModelVersion, ObservationRequest, ObservingLocation, ParameterLayout};
pub use response::{ServiceResponse, XmlValue};
pub use units::{MjyPerSr, Wavelength, WavelengthUnit};
