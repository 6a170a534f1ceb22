//! WITSML document builder
//!
//! Hand-built documents shaped like WITSML 1.x `wells` objects. These are
//! sample payloads for display and download, not schema-validated WITSML.
//!
//! - [`sample_xml`] / [`sample_json`]: template document for a data type
//! - [`export_entries_xml`]: stored entries wrapped in a `<wells>` envelope

use std::io::Cursor;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Value};

use crate::types::{WitsmlDataEntry, DEFAULT_WITSML_VERSION};

const WITSML_NAMESPACE: &str = "http://www.witsml.org/schemas/1series";
const WELLBORE_UID: &str = "WB001";

#[derive(Debug, thiserror::Error)]
pub enum WitsmlError {
    #[error("XML write failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Which wellbore block a data type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// `<log>` with ROP / WOB / RPM curves
    Drilling,
    /// `<production>` with daily oil / gas / water volumes
    Production,
    /// No wellbore block
    Other,
}

impl SampleKind {
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "drilling" => Self::Drilling,
            "production" => Self::Production,
            _ => Self::Other,
        }
    }
}

/// Response format for WITSML endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// Anything other than `xml` (case-insensitive) is JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("xml") => Self::Xml,
            _ => Self::Json,
        }
    }
}

// ============================================================================
// Curve tables
// ============================================================================

struct Curve {
    mnemonic: &'static str,
    unit: &'static str,
    value: f64,
}

const DRILLING_CURVES: [Curve; 3] = [
    Curve { mnemonic: "ROP", unit: "m/h", value: 25.5 },
    Curve { mnemonic: "WOB", unit: "kN", value: 125.3 },
    Curve { mnemonic: "RPM", unit: "/min", value: 120.0 },
];

const LOG_START_INDEX_M: f64 = 3250.0;
const LOG_END_INDEX_M: f64 = 3255.0;

const PROD_PERIOD_DAYS: f64 = 1.0;
const VOL_OIL_M3: f64 = 1250.0;
const VOL_GAS_M3: f64 = 85000.0;
const VOL_WATER_M3: f64 = 150.0;

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// XML
// ============================================================================

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn new_writer() -> Result<XmlWriter, WitsmlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(writer)
}

fn finish(writer: XmlWriter) -> Result<String, WitsmlError> {
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> quick_xml::Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn measure_element(
    writer: &mut XmlWriter,
    name: &str,
    uom: &str,
    value: f64,
) -> quick_xml::Result<()> {
    writer
        .create_element(name)
        .with_attribute(("uom", uom))
        .write_text_content(BytesText::new(&value.to_string()))?;
    Ok(())
}

fn common_data(writer: &mut XmlWriter, stamp: &str) -> quick_xml::Result<()> {
    writer
        .create_element("commonData")
        .write_inner_content(|w| text_element(w, "dTimStamp", stamp))?;
    Ok(())
}

/// Writes the `<wellbore>` block for `kind`; no-op for [`SampleKind::Other`].
fn write_wellbore(writer: &mut XmlWriter, kind: SampleKind, stamp: &str) -> quick_xml::Result<()> {
    if kind == SampleKind::Other {
        return Ok(());
    }

    writer
        .create_element("wellbore")
        .with_attribute(("uid", WELLBORE_UID))
        .write_inner_content(|w| {
            text_element(w, "name", "Main Wellbore")?;
            common_data(w, stamp)?;
            match kind {
                SampleKind::Drilling => write_log(w),
                SampleKind::Production => write_production(w, stamp),
                SampleKind::Other => Ok(()),
            }
        })?;
    Ok(())
}

fn write_log(writer: &mut XmlWriter) -> quick_xml::Result<()> {
    writer
        .create_element("log")
        .with_attribute(("uid", "LOG001"))
        .write_inner_content(|w| {
            text_element(w, "name", "Drilling Parameters")?;
            text_element(w, "indexType", "measured depth")?;
            measure_element(w, "startIndex", "m", LOG_START_INDEX_M)?;
            measure_element(w, "endIndex", "m", LOG_END_INDEX_M)?;
            for curve in &DRILLING_CURVES {
                w.create_element("logData").write_inner_content(|d| {
                    text_element(d, "mnemonic", curve.mnemonic)?;
                    text_element(d, "unit", curve.unit)?;
                    text_element(d, "value", &curve.value.to_string())
                })?;
            }
            Ok::<(), quick_xml::Error>(())
        })?;
    Ok(())
}

fn write_production(writer: &mut XmlWriter, stamp: &str) -> quick_xml::Result<()> {
    writer
        .create_element("production")
        .with_attribute(("uid", "PROD001"))
        .write_inner_content(|w| {
            text_element(w, "name", "Daily Production")?;
            text_element(w, "dTimProd", stamp)?;
            measure_element(w, "prodPeriod", "d", PROD_PERIOD_DAYS)?;
            text_element(w, "fluidType", "oil")?;
            measure_element(w, "volOil", "m3", VOL_OIL_M3)?;
            measure_element(w, "volGas", "m3", VOL_GAS_M3)?;
            measure_element(w, "volWater", "m3", VOL_WATER_M3)
        })?;
    Ok(())
}

/// Sample WITSML XML document for one well.
pub fn sample_xml(
    data_type: &str,
    well_id: &str,
    timestamp: DateTime<Utc>,
) -> Result<String, WitsmlError> {
    let stamp = iso(timestamp);
    let kind = SampleKind::from_data_type(data_type);
    let mut writer = new_writer()?;

    writer
        .create_element("wells")
        .with_attribute(("version", DEFAULT_WITSML_VERSION))
        .with_attribute(("xmlns", WITSML_NAMESPACE))
        .write_inner_content(|w| {
            w.create_element("well")
                .with_attribute(("uid", well_id))
                .write_inner_content(|w| {
                    text_element(w, "name", &format!("Well-{well_id}"))?;
                    text_element(w, "status", "drilling")?;
                    common_data(w, &stamp)?;
                    write_wellbore(w, kind, &stamp)
                })?;
            Ok::<(), quick_xml::Error>(())
        })?;

    finish(writer)
}

/// Wrap stored entries in a `<wells>` envelope.
///
/// Each entry's stored XML payload is embedded verbatim in `<data>`. Entries
/// without a payload get the generated wellbore block for their data type,
/// or no `<data>` element if the type has none.
pub fn export_entries_xml(entries: &[WitsmlDataEntry]) -> Result<String, WitsmlError> {
    let mut writer = new_writer()?;

    writer
        .create_element("wells")
        .with_attribute(("version", DEFAULT_WITSML_VERSION))
        .write_inner_content(|w| {
            for entry in entries {
                let stamp = iso(entry.timestamp);
                let kind = SampleKind::from_data_type(&entry.data_type);
                w.create_element("well")
                    .with_attribute(("uid", entry.well_id.as_str()))
                    .write_inner_content(|w| {
                        text_element(w, "dataType", &entry.data_type)?;
                        text_element(w, "version", &entry.version)?;
                        text_element(w, "dTimStamp", &stamp)?;
                        match &entry.xml_data {
                            Some(raw) => {
                                w.create_element("data").write_inner_content(|d| {
                                    d.write_event(Event::Text(BytesText::from_escaped(
                                        raw.as_str(),
                                    )))
                                })?;
                            }
                            None if kind != SampleKind::Other => {
                                w.create_element("data")
                                    .write_inner_content(|d| write_wellbore(d, kind, &stamp))?;
                            }
                            None => {}
                        }
                        Ok::<(), quick_xml::Error>(())
                    })?;
            }
            Ok::<(), quick_xml::Error>(())
        })?;

    finish(writer)
}

// ============================================================================
// JSON
// ============================================================================

fn wellbore_json(kind: SampleKind, stamp: &str) -> Option<Value> {
    match kind {
        SampleKind::Drilling => {
            let log_data: Vec<Value> = DRILLING_CURVES
                .iter()
                .map(|c| json!({ "mnemonic": c.mnemonic, "unit": c.unit, "value": c.value }))
                .collect();
            Some(json!({
                "uid": WELLBORE_UID,
                "name": "Main Wellbore",
                "log": {
                    "uid": "LOG001",
                    "name": "Drilling Parameters",
                    "indexType": "measured depth",
                    "startIndex": { "value": LOG_START_INDEX_M, "uom": "m" },
                    "endIndex": { "value": LOG_END_INDEX_M, "uom": "m" },
                    "logData": log_data,
                }
            }))
        }
        SampleKind::Production => Some(json!({
            "uid": WELLBORE_UID,
            "name": "Main Wellbore",
            "production": {
                "uid": "PROD001",
                "name": "Daily Production",
                "dTimProd": stamp,
                "prodPeriod": { "value": PROD_PERIOD_DAYS, "uom": "d" },
                "fluidType": "oil",
                "volOil": { "value": VOL_OIL_M3, "uom": "m3" },
                "volGas": { "value": VOL_GAS_M3, "uom": "m3" },
                "volWater": { "value": VOL_WATER_M3, "uom": "m3" },
            }
        })),
        SampleKind::Other => None,
    }
}

/// Sample WITSML document as JSON, same shape as [`sample_xml`].
pub fn sample_json(data_type: &str, well_id: &str, timestamp: DateTime<Utc>) -> Value {
    let stamp = iso(timestamp);
    let mut well = json!({
        "uid": well_id,
        "name": format!("Well-{well_id}"),
        "status": "drilling",
        "commonData": { "dTimStamp": stamp },
    });
    if let Some(wellbore) = wellbore_json(SampleKind::from_data_type(data_type), &stamp) {
        well["wellbore"] = wellbore;
    }
    json!({
        "wells": {
            "version": DEFAULT_WITSML_VERSION,
            "well": well,
        }
    })
}
