use crate::models::uplink::UplinkEvent;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// The firmware displays distance in 250 m steps: 1 means "within 250 m".
const UNIT_METERS: f64 = 250.0;
const MAX_DISTANCE_UNITS: u32 = 255;

/// Offset the RAK10701 firmware applies to fit dBm readings into an
/// unsigned byte (-200..55 dBm maps to 0..255).
const RSSI_OFFSET: i64 = 200;

/// Marker byte the device requires as the first payload value.
const PAYLOAD_MARKER: i64 = 1;

/// Aggregate signal-quality and distance metrics for one uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalMetrics {
    pub min_rssi_encoded: i64,
    pub max_rssi_encoded: i64,
    pub min_distance_units: u32,
    pub max_distance_units: u32,
    pub gateway_count: usize,
}

impl SignalMetrics {
    /// Computes RSSI bounds and distance buckets over every gateway that
    /// received the uplink. The decoder guarantees `receptions` is
    /// non-empty.
    ///
    /// Coordinates are not range-checked; bad geodata flows through the
    /// haversine math as garbage buckets and is caught (if at all) by the
    /// encoder's byte-range validation.
    pub fn from_event(event: &UplinkEvent) -> Self {
        let mut min_rssi = i32::MAX;
        let mut max_rssi = i32::MIN;
        let mut min_units = MAX_DISTANCE_UNITS;
        let mut max_units = 1;
        for reception in &event.receptions {
            min_rssi = min_rssi.min(reception.rssi);
            max_rssi = max_rssi.max(reception.rssi);
            let units = distance_units(haversine_meters(event.device_location, reception.location));
            min_units = min_units.min(units);
            max_units = max_units.max(units);
        }
        Self {
            min_rssi_encoded: i64::from(min_rssi) + RSSI_OFFSET,
            max_rssi_encoded: i64::from(max_rssi) + RSSI_OFFSET,
            min_distance_units: min_units,
            max_distance_units: max_units,
            gateway_count: event.receptions.len(),
        }
    }

    /// The six downlink values in the order the firmware expects them.
    pub fn payload_values(&self) -> [i64; 6] {
        [
            PAYLOAD_MARKER,
            self.min_rssi_encoded,
            self.max_rssi_encoded,
            i64::from(self.min_distance_units),
            i64::from(self.max_distance_units),
            self.gateway_count as i64,
        ]
    }
}

/// Great-circle distance in meters between two (latitude, longitude) pairs
/// in decimal degrees, haversine on a spherical Earth.
pub fn haversine_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Buckets a distance into the firmware's 250 m units, clamped to 255 and
/// never below 1.
pub fn distance_units(meters: f64) -> u32 {
    let units = 1 + (meters.floor() / UNIT_METERS) as u32;
    units.min(MAX_DISTANCE_UNITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::uplink::{GatewayReception, UplinkEvent};

    #[test]
    fn zero_distance_buckets_to_one() {
        let d = haversine_meters((47.0, 8.0), (47.0, 8.0));
        assert_eq!(d, 0.0);
        assert_eq!(distance_units(d), 1);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = (47.0, 8.0);
        let b = (47.5, 8.6);
        let ab = haversine_meters(a, b);
        let ba = haversine_meters(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn buckets_are_monotonic_in_distance() {
        let distances = [0.0, 249.0, 251.0, 1000.0, 10_000.0, 63_749.0, 1.0e7];
        let mut last = 0;
        for d in distances {
            let units = distance_units(d);
            assert!(units >= last, "bucket regressed at {} m", d);
            last = units;
        }
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(distance_units(249.9), 1);
        assert_eq!(distance_units(250.0), 2);
        assert_eq!(distance_units(499.9), 2);
        assert_eq!(distance_units(500.0), 3);
    }

    #[test]
    fn bucket_clamps_at_255() {
        // 63,750 m would be bucket 256 unclamped.
        assert_eq!(distance_units(63_750.0), 255);
        assert_eq!(distance_units(1.0e9), 255);
    }

    #[test]
    fn single_gateway_250m_north() {
        // 0.00225 deg of latitude is ~250.19 m on this sphere, so the
        // measurement lands just past the first bucket boundary.
        let device = (47.0, 8.0);
        let gateway = (47.00225, 8.0);
        let d = haversine_meters(device, gateway);
        assert!(d > 250.0 && d < 250.4, "got {} m", d);
        assert_eq!(distance_units(d), 2);

        let event = UplinkEvent {
            dev_eui: "ac1f09fffe06df38".to_string(),
            device_location: device,
            receptions: vec![GatewayReception {
                rssi: -60,
                location: gateway,
            }],
        };
        let metrics = SignalMetrics::from_event(&event);
        assert_eq!(metrics.min_rssi_encoded, 140);
        assert_eq!(metrics.max_rssi_encoded, 140);
        assert_eq!(metrics.gateway_count, 1);
        assert_eq!(metrics.payload_values(), [1, 140, 140, 2, 2, 1]);
    }

    #[test]
    fn aggregates_over_multiple_gateways() {
        let event = UplinkEvent {
            dev_eui: "ac1f09fffe06df38".to_string(),
            device_location: (47.0, 8.0),
            receptions: vec![
                GatewayReception {
                    rssi: -60,
                    location: (47.0, 8.0),
                },
                GatewayReception {
                    rssi: -97,
                    location: (47.031, 8.044),
                },
            ],
        };
        let metrics = SignalMetrics::from_event(&event);
        assert_eq!(metrics.min_rssi_encoded, -97 + 200);
        assert_eq!(metrics.max_rssi_encoded, -60 + 200);
        assert_eq!(metrics.min_distance_units, 1);
        assert!(metrics.max_distance_units > metrics.min_distance_units);
        assert_eq!(metrics.gateway_count, 2);
    }

    #[test]
    fn rssi_offset_is_not_clamped_here() {
        // +100 dBm is nonsense, but the calculator passes it through; the
        // encoder's range check is what rejects the resulting 300.
        let event = UplinkEvent {
            dev_eui: "ac1f09fffe06df38".to_string(),
            device_location: (47.0, 8.0),
            receptions: vec![GatewayReception {
                rssi: 100,
                location: (47.0, 8.0),
            }],
        };
        let metrics = SignalMetrics::from_event(&event);
        assert_eq!(metrics.max_rssi_encoded, 300);
    }
}
