use crate::error::EncodeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

/// LoRaWAN port the RAK10701 firmware listens on for field-test results.
pub const DOWNLINK_FPORT: &str = "2";

/// Downlink command body as ChirpStack expects it on
/// `application/{id}/device/{devEui}/command/down`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownlinkCommand {
    pub dev_eui: String,
    pub confirmed: bool,
    pub f_port: String,
    pub data: String,
}

impl DownlinkCommand {
    /// Builds an unconfirmed downlink carrying the six metric values packed
    /// one byte each and base64-encoded.
    pub fn new(dev_eui: &str, values: [i64; 6]) -> Result<Self, EncodeError> {
        let payload = encode_payload(values)?;
        Ok(Self {
            dev_eui: dev_eui.to_string(),
            confirmed: false,
            f_port: DOWNLINK_FPORT.to_string(),
            data: STANDARD.encode(payload),
        })
    }
}

/// Packs the six downlink values into bytes, rejecting any value that does
/// not fit. The field tester reads exactly one byte per value, so silent
/// truncation would corrupt the numbers shown on the device.
pub fn encode_payload(values: [i64; 6]) -> Result<[u8; 6], EncodeError> {
    let mut bytes = [0u8; 6];
    for (index, &value) in values.iter().enumerate() {
        bytes[index] =
            u8::try_from(value).map_err(|_| EncodeError::PayloadOutOfRange { index, value })?;
    }
    Ok(bytes)
}

pub fn downlink_topic(application_id: &str, dev_eui: &str) -> String {
    format!(
        "application/{}/device/{}/command/down",
        application_id, dev_eui
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips_exact_bytes() {
        let command = DownlinkCommand::new("ac1f09fffe06df38", [1, 140, 147, 1, 23, 2]).unwrap();
        let decoded = STANDARD.decode(&command.data).unwrap();
        assert_eq!(decoded, vec![1, 140, 147, 1, 23, 2]);
    }

    #[test]
    fn rejects_value_above_byte_range() {
        let err = encode_payload([1, 300, 147, 1, 23, 2]).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::PayloadOutOfRange { index: 1, value: 300 }
        ));
    }

    #[test]
    fn rejects_negative_value() {
        // Raw RSSI below -200 would underflow the firmware offset.
        let err = encode_payload([1, -5, 147, 1, 23, 2]).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::PayloadOutOfRange { index: 1, value: -5 }
        ));
    }

    #[test]
    fn serializes_chirpstack_wire_shape() {
        let command = DownlinkCommand::new("ac1f09fffe06df38", [1, 140, 140, 2, 2, 1]).unwrap();
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["devEui"], "ac1f09fffe06df38");
        assert_eq!(json["confirmed"], false);
        assert_eq!(json["fPort"], "2");
        assert_eq!(json["data"], STANDARD.encode([1u8, 140, 140, 2, 2, 1]));
    }

    #[test]
    fn downlink_topic_is_device_scoped() {
        assert_eq!(
            downlink_topic("1699a6c3", "ac1f09fffe06df38"),
            "application/1699a6c3/device/ac1f09fffe06df38/command/down"
        );
    }
}
