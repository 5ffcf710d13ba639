use anyhow::{Context, bail};
use bgmodel_core::{
    BackgroundModel, Config, Frame, HttpTransport, ModelVersion, ObservationRequest,
    ObservingLocation, ParameterLayout, SkyCoord, Wavelength, WavelengthUnit,
    client::FAILURE_WARNING,
    units::{MegajanskyPerSteradian, MjyPerSr},
};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select};
use qtty::Unit;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "bgmodel", version, about = "Infrared sky background model CLI")]
pub struct Cli {
    /// Log request details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set query defaults and service options.
    Configure,

    /// Query the background at one position, date and wavelength.
    Query(QueryArgs),
}

#[derive(Debug, clap::Args)]
pub struct QueryArgs {
    /// Right ascension (or galactic longitude), e.g. "0h39m15.9s", "00:39:15.9" or "9.816".
    #[arg(long, allow_hyphen_values = true)]
    ra: String,

    /// Declination (or galactic latitude), e.g. "0d53m17.016s" or "-12.5".
    #[arg(long, allow_hyphen_values = true)]
    dec: String,

    /// Frame the coordinates are given in: icrs or galactic.
    #[arg(long, default_value = "icrs")]
    frame: String,

    /// Observing wavelength.
    #[arg(long)]
    wavelength: f64,

    /// Wavelength unit: micron, nm, angstrom, mm or m.
    #[arg(long, default_value = "micron")]
    unit: String,

    /// Observation date as YYYY-MM-DD; today (UTC) if absent.
    #[arg(long)]
    date: Option<String>,

    /// Observing location: Earth or L2.
    #[arg(long)]
    location: Option<String>,

    /// Zodiacal model: Wright or Kelsall.
    #[arg(long)]
    model: Option<String>,

    /// Use the median over the visibility window.
    #[arg(long, conflicts_with = "instant")]
    median: bool,

    /// Use the instantaneous value instead of the median.
    #[arg(long)]
    instant: bool,

    /// Lay out query parameters the way older clients did.
    #[arg(long)]
    legacy_url: bool,

    /// Print the query URL without contacting the service.
    #[arg(long)]
    dry_run: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Query(args) => query(args).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let locations = ObservingLocation::all().to_vec();
    let start = locations.iter().position(|l| *l == cfg.defaults.observing_location).unwrap_or(0);
    cfg.defaults.observing_location = Select::new("Default observing location:", locations)
        .with_starting_cursor(start)
        .prompt()?;

    let versions = ModelVersion::all().to_vec();
    let start = versions.iter().position(|v| *v == cfg.defaults.code_version).unwrap_or(0);
    cfg.defaults.code_version =
        Select::new("Default zodiacal model:", versions).with_starting_cursor(start).prompt()?;

    cfg.defaults.median = Confirm::new("Use the median over the visibility window by default?")
        .with_default(cfg.defaults.median)
        .prompt()?;

    cfg.service.timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(cfg.service.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    let layouts = vec![ParameterLayout::Corrected, ParameterLayout::Legacy];
    let start = layouts.iter().position(|l| *l == cfg.service.parameter_layout).unwrap_or(0);
    cfg.service.parameter_layout =
        Select::new("Query parameter layout:", layouts).with_starting_cursor(start).prompt()?;

    let path = cfg.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

async fn query(args: QueryArgs) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let frame = Frame::try_from(args.frame.as_str())?;
    let coordinates = SkyCoord::parse(&args.ra, &args.dec, frame)?;
    let unit = WavelengthUnit::try_from(args.unit.as_str())?;
    let date = match args.date.as_deref() {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("'{s}' is not a date in YYYY-MM-DD form"))?,
        None => Utc::now().date_naive(),
    };

    let location = args
        .location
        .unwrap_or_else(|| cfg.defaults.observing_location.as_str().to_string());
    let version = args.model.unwrap_or_else(|| cfg.defaults.code_version.as_str().to_string());
    let median = if args.instant { false } else { args.median || cfg.defaults.median };

    let request = ObservationRequest::new(
        coordinates,
        Wavelength::new(args.wavelength, unit),
        date,
        &location,
        &version,
        median,
    )?;

    if args.legacy_url {
        cfg.service.parameter_layout = ParameterLayout::Legacy;
    }

    if args.dry_run {
        println!("{}", request.url(&cfg.service.base_url, cfg.service.parameter_layout));
        return Ok(());
    }

    let transport = HttpTransport::from_config(&cfg.service)?;
    let model = BackgroundModel::query(&transport, request, &cfg.service).await;

    if args.json {
        print_json(&model)?;
    } else {
        print_table(&model);
    }

    if let Err(err) = model.outcome() {
        bail!("{FAILURE_WARNING} ({err})");
    }

    Ok(())
}

fn print_table(model: &BackgroundModel) {
    let req = model.request();
    println!("Position:    {} (ICRS)", req.locstr());
    println!("Wavelength:  {}", req.wavelength());
    println!("Date:        {} (year {}, day {})", req.date(), req.year(), req.day());
    println!(
        "Model:       {} from {}, {}",
        req.version(),
        req.location(),
        if req.median() { "median" } else { "instantaneous" }
    );
    println!("Status:      {}", model.request_status().unwrap_or("-"));

    if let Ok(m) = model.outcome() {
        println!();
        println!("Zodiacal light:   {}", brightness(m.zodiacal_light));
        println!("ISM:              {}", brightness(m.ism));
        println!("Stars:            {}", brightness(m.stars));
        println!("CIB:              {}", brightness(m.cib));
        println!("Total background: {}", brightness(m.total_background));
    }
}

fn brightness(q: MjyPerSr) -> String {
    format!("{} {}", q.value(), MegajanskyPerSteradian::SYMBOL)
}

fn print_json(model: &BackgroundModel) -> anyhow::Result<()> {
    let req = model.request();
    let value = serde_json::json!({
        "url": model.url(),
        "status": model.request_status(),
        "request": {
            "locstr": req.locstr(),
            "wavelength_um": req.wavelength(),
            "year": req.year(),
            "day": req.day(),
            "observing_location": req.location(),
            "code_version": req.version(),
            "median": req.median(),
        },
        "measurement": model.measurement(),
        "unit": MegajanskyPerSteradian::SYMBOL,
        "error": model.outcome().err().map(|e| e.to_string()),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_declination_parses() {
        let cli = Cli::try_parse_from([
            "bgmodel", "query", "--ra", "12:30:00", "--dec", "-45:15:30", "--wavelength", "3.5",
        ])
        .expect("arguments should parse");

        let Command::Query(args) = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.dec, "-45:15:30");
        assert_eq!(args.frame, "icrs");
        assert_eq!(args.unit, "micron");
    }

    #[test]
    fn brightness_is_printed_with_its_unit() {
        assert_eq!(brightness(MjyPerSr::new(13.8)), "13.8 MJy/sr");
    }

    #[test]
    fn median_and_instant_conflict() {
        let res = Cli::try_parse_from([
            "bgmodel", "query", "--ra", "1", "--dec", "1", "--wavelength", "1", "--median",
            "--instant",
        ]);
        assert!(res.is_err());
    }
}
