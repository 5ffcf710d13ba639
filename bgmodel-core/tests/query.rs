use std::{
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bgmodel_core::{
    BackgroundModel, FetchError, Frame, ObservationRequest, ParameterLayout, ServiceConfig,
    SkyCoord, Transport, client::FAILURE_WARNING, units::MjyPerSr,
};
use chrono::NaiveDate;
use qtty::Micrometers;
use tracing_subscriber::fmt::MakeWriter;

const OK_XML: &str = r#"<?xml version="1.0"?>
<results status="ok">
  <input>
    <locstr>00h39m15.900s+00d53m17.016s</locstr>
    <wavelength>200.0</wavelength>
    <year>2019</year>
    <day>103</day>
  </input>
  <result>
    <statistics>
      <zody>1.23</zody>
      <ism>4.56</ism>
      <stars>7.89</stars>
      <cib>0.12</cib>
      <totbg>13.8</totbg>
    </statistics>
  </result>
</results>"#;

/// Replays a fixed reply and records the URLs it was asked for.
#[derive(Debug)]
struct CannedTransport {
    reply: Result<String, String>,
    seen: Mutex<Vec<String>>,
}

impl CannedTransport {
    fn body(body: &str) -> Self {
        Self { reply: Ok(body.to_string()), seen: Mutex::new(Vec::new()) }
    }

    fn failing(message: &str) -> Self {
        Self { reply: Err(message.to_string()), seen: Mutex::new(Vec::new()) }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.seen.lock().unwrap().push(url.to_string());
        self.reply.clone().map_err(FetchError::Network)
    }
}

/// Collects formatted log lines so tests can assert on them.
#[derive(Debug, Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl MakeWriter<'_> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&self) -> Self::Writer {
        self.clone()
    }
}

fn request() -> ObservationRequest {
    ObservationRequest::new(
        SkyCoord::parse("0h39m15.9s", "0d53m17.016s", Frame::Icrs).unwrap(),
        Micrometers::new(200.0),
        NaiveDate::from_ymd_opt(2019, 4, 13).unwrap(),
        "L2",
        "Wright",
        true,
    )
    .unwrap()
}

fn service() -> ServiceConfig {
    ServiceConfig { base_url: "http://bg.test/nph-bgmodel".to_string(), ..ServiceConfig::default() }
}

#[tokio::test]
async fn successful_reply_populates_all_five_values() {
    let transport = CannedTransport::body(OK_XML);
    let model = BackgroundModel::query(&transport, request(), &service()).await;

    assert!(model.is_success());
    assert_eq!(model.request_status(), Some("ok"));

    let mjy = |v| Some(MjyPerSr::new(v));
    assert_eq!(model.zodiacal_light(), mjy(1.23));
    assert_eq!(model.ism(), mjy(4.56));
    assert_eq!(model.stars(), mjy(7.89));
    assert_eq!(model.cib(), mjy(0.12));
    assert_eq!(model.total_background(), mjy(13.8));

    let response = model.response().expect("response kept");
    assert_eq!(
        response.tree().path(&["results", "input", "day"]).and_then(|v| v.as_text()),
        Some("103")
    );
}

#[tokio::test]
async fn sends_exactly_the_built_url() {
    let transport = CannedTransport::body(OK_XML);
    let model = BackgroundModel::query(&transport, request(), &service()).await;

    assert_eq!(
        transport.seen(),
        vec![
            "http://bg.test/nph-bgmodel?locstr=00h39m15.900s+00d53m17.016s&wavelength=200.0\
             &year=2019&day=103&obslocin=1&obsverin=0&ido_viewin=1"
                .to_string()
        ]
    );
    assert_eq!(model.url(), transport.seen()[0]);
}

#[tokio::test]
async fn legacy_layout_is_opt_in() {
    let transport = CannedTransport::body(OK_XML);
    let config = ServiceConfig { parameter_layout: ParameterLayout::Legacy, ..service() };
    let model = BackgroundModel::query(&transport, request(), &config).await;

    assert!(model.url().ends_with("&obslocin=1&ido_viewin=0"));
}

#[tokio::test]
async fn network_failure_leaves_values_unset() {
    let logs = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = CannedTransport::failing("connection refused");
    let model = BackgroundModel::query(&transport, request(), &service()).await;

    let logged = logs.contents();
    assert!(logged.contains("WARN"));
    assert!(logged.contains(FAILURE_WARNING));
    assert!(logged.contains("Sorry, something went wrong. Try again."));
    assert!(logged.contains("connection refused"));

    assert!(!model.is_success());
    assert!(model.response().is_none());
    assert!(model.request_status().is_none());
    assert!(model.zodiacal_light().is_none());
    assert!(matches!(model.outcome(), Err(FetchError::Network(m)) if m == "connection refused"));
}

#[tokio::test]
async fn non_numeric_field_leaves_every_value_unset() {
    let body = OK_XML.replace("<ism>4.56</ism>", "<ism>N/A</ism>");
    let transport = CannedTransport::body(&body);
    let model = BackgroundModel::query(&transport, request(), &service()).await;

    assert!(model.zodiacal_light().is_none());
    assert!(model.ism().is_none());
    assert!(model.total_background().is_none());
    assert!(matches!(model.outcome(), Err(FetchError::NoNumber { field, .. }) if field == "ism"));
    assert_eq!(model.request_status(), Some("ok"));
}

#[tokio::test]
async fn error_status_is_distinguished_from_missing_field() {
    let transport = CannedTransport::body(
        r#"<results status="error"><message>Wavelength out of range</message></results>"#,
    );
    let model = BackgroundModel::query(&transport, request(), &service()).await;

    assert_eq!(model.request_status(), Some("error"));
    assert!(matches!(
        model.outcome(),
        Err(FetchError::StatusNotOk { status, message: Some(m) })
            if status == "error" && m == "Wavelength out of range"
    ));
}

#[tokio::test]
async fn garbage_body_is_an_xml_error() {
    let transport = CannedTransport::body("<html><body>Service Unavailable");
    let model = BackgroundModel::query(&transport, request(), &service()).await;

    assert!(matches!(model.outcome(), Err(FetchError::Xml(_))));
}
