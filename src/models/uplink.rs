use crate::error::MalformedUplink;
use serde_json::{Map, Value};

/// ChirpStack publishes several event types (join, ack, status, log...) on
/// the same application topic tree. Uplink events are the ones whose JSON
/// body starts with this key; everything else is skipped without error.
const UPLINK_MARKER_KEY: &str = "deduplicationId";

#[derive(Debug, Clone, PartialEq)]
pub struct UplinkEvent {
    pub dev_eui: String,
    /// Device-reported (latitude, longitude) in decimal degrees.
    pub device_location: (f64, f64),
    /// One entry per gateway that received the uplink. Never empty.
    pub receptions: Vec<GatewayReception>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReception {
    pub rssi: i32,
    pub location: (f64, f64),
}

/// Decodes one raw message body. `Ok(None)` means a different event type
/// sharing the bus, deliberately ignored; `Err` means an uplink event whose
/// fields could not be fully extracted.
///
/// The relevance test inspects the first key of the top-level object in
/// source order. serde_json is built with `preserve_order`, otherwise the
/// check would be meaningless.
pub fn decode_uplink(payload: &[u8]) -> Result<Option<UplinkEvent>, MalformedUplink> {
    let value: Value = serde_json::from_slice(payload)?;
    let root = value.as_object().ok_or(MalformedUplink::NotAnObject)?;

    match root.keys().next() {
        Some(key) if key == UPLINK_MARKER_KEY => {}
        _ => return Ok(None),
    }

    let device_info = field(root, "deviceInfo")?;
    let dev_eui = device_info
        .get("devEui")
        .ok_or(MalformedUplink::MissingField("devEui"))?
        .as_str()
        .ok_or(MalformedUplink::WrongType("devEui"))?
        .to_string();

    let object = field(root, "object")?;
    let device_location = (f64_at(object, "latitude")?, f64_at(object, "longitude")?);

    let rx_info = field(root, "rxInfo")?
        .as_array()
        .ok_or(MalformedUplink::WrongType("rxInfo"))?;
    if rx_info.is_empty() {
        return Err(MalformedUplink::NoReceptions);
    }

    let mut receptions = Vec::with_capacity(rx_info.len());
    for info in rx_info {
        let rssi = info
            .get("rssi")
            .ok_or(MalformedUplink::MissingField("rssi"))?
            .as_i64()
            .ok_or(MalformedUplink::WrongType("rssi"))? as i32;
        let location = info
            .get("location")
            .ok_or(MalformedUplink::MissingField("location"))?;
        receptions.push(GatewayReception {
            rssi,
            location: (
                round5(f64_at(location, "latitude")?),
                round5(f64_at(location, "longitude")?),
            ),
        });
    }

    Ok(Some(UplinkEvent {
        dev_eui,
        device_location,
        receptions,
    }))
}

fn field<'a>(root: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, MalformedUplink> {
    root.get(name).ok_or(MalformedUplink::MissingField(name))
}

fn f64_at(value: &Value, name: &'static str) -> Result<f64, MalformedUplink> {
    value
        .get(name)
        .ok_or(MalformedUplink::MissingField(name))?
        .as_f64()
        .ok_or(MalformedUplink::WrongType(name))
}

/// Gateway coordinates arrive with more precision than the distance math
/// needs; 5 decimal places is about 1 m of resolution.
fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}
