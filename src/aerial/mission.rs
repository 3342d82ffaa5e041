//! Flight plan types and the fixed-point coordinate encoding

/// Scale factor between degrees and the wire's fixed-point integers.
const DEGREE_SCALE: f64 = 1e7;

/// Encode an angular coordinate for transmission: `round(degrees * 10^7)`.
pub fn encode_degrees(degrees: f64) -> i32 {
    (degrees * DEGREE_SCALE).round() as i32
}

/// Inverse of [`encode_degrees`].
pub fn decode_degrees(encoded: i32) -> f64 {
    encoded as f64 / DEGREE_SCALE
}

/// A WGS-84 position in plain degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl GeoPoint {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    /// True when both components are inside the valid coordinate box.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude_deg)
            && (-180.0..=180.0).contains(&self.longitude_deg)
    }

    pub fn encoded_latitude(&self) -> i32 {
        encode_degrees(self.latitude_deg)
    }

    pub fn encoded_longitude(&self) -> i32 {
        encode_degrees(self.longitude_deg)
    }
}

/// What one flight-plan step tells the vehicle to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissionCommand {
    /// Climb out from the given point.
    Takeoff,
    /// Fly through the given point, optionally turning to a heading
    /// (NaN keeps the current heading).
    Waypoint { heading_deg: f32 },
    /// Descend at the given point. A final landing stops the plan there;
    /// otherwise the vehicle continues past the touch point.
    Landing { final_landing: bool },
    /// Change cruise speed from this step onward. Carries no position.
    CruiseSpeed { meters_per_second: f32 },
}

/// One ordered step of a flight plan. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionItem {
    pub seq: u16,
    pub command: MissionCommand,
    pub position: GeoPoint,
    pub altitude_m: f32,
}

impl MissionItem {
    pub fn takeoff(seq: u16, position: GeoPoint, altitude_m: f32) -> Self {
        Self {
            seq,
            command: MissionCommand::Takeoff,
            position,
            altitude_m,
        }
    }

    pub fn waypoint(seq: u16, position: GeoPoint, altitude_m: f32, heading_deg: f32) -> Self {
        Self {
            seq,
            command: MissionCommand::Waypoint { heading_deg },
            position,
            altitude_m,
        }
    }

    pub fn landing(seq: u16, position: GeoPoint, altitude_m: f32, final_landing: bool) -> Self {
        Self {
            seq,
            command: MissionCommand::Landing { final_landing },
            position,
            altitude_m,
        }
    }

    pub fn cruise_speed(seq: u16, meters_per_second: f32) -> Self {
        Self {
            seq,
            command: MissionCommand::CruiseSpeed { meters_per_second },
            position: GeoPoint::new(0.0, 0.0),
            altitude_m: 0.0,
        }
    }
}

/// An ordered, fixed-length flight plan. The declared count is always sent
/// to the vehicle before any item.
#[derive(Debug, Clone)]
pub struct Mission {
    items: Vec<MissionItem>,
}

impl Mission {
    /// Build a mission from ordered items. Sequence indices must match the
    /// item positions; the upload contract depends on it.
    pub fn new(items: Vec<MissionItem>) -> Self {
        debug_assert!(
            items.iter().enumerate().all(|(i, item)| item.seq as usize == i),
            "mission items must be numbered 0..n in order"
        );
        Self { items }
    }

    /// The declared item count.
    pub fn len(&self) -> u16 {
        self.items.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MissionItem] {
        &self.items
    }
}

/// Primary flight modes the vehicle understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlightMode {
    AltitudeHold = 2,
    Position = 3,
    Mission = 4,
    ReturnHome = 5,
}

/// Sub-modes of [`FlightMode::Mission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MissionSubmode {
    AutoTakeoff = 2,
    AutoTrack = 3,
    AutoMission = 4,
    AutoReturn = 5,
    AutoLand = 6,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip_within_wire_precision() {
        let corners = [
            (-90.0, -180.0),
            (-90.0, 180.0),
            (90.0, -180.0),
            (90.0, 180.0),
            (31.2304, 121.4737),
            (-33.8688, 151.2093),
            (0.0, 0.0),
            (47.123_456_7, -122.765_432_1),
        ];
        for (lat, lon) in corners {
            assert!((decode_degrees(encode_degrees(lat)) - lat).abs() < 1e-7);
            assert!((decode_degrees(encode_degrees(lon)) - lon).abs() < 1e-7);
        }
    }

    #[test]
    fn encoding_rounds_rather_than_truncates() {
        // 1.99999999 * 1e7 = 19999999.9; truncation would lose a digit.
        assert_eq!(encode_degrees(1.999_999_99), 20_000_000);
        assert_eq!(encode_degrees(-1.999_999_99), -20_000_000);
    }

    #[test]
    fn coordinate_box_validation() {
        assert!(GeoPoint::new(45.0, 120.0).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn mission_reports_declared_count() {
        let pad = GeoPoint::new(31.0, 121.0);
        let mission = Mission::new(vec![
            MissionItem::takeoff(0, pad, 50.0),
            MissionItem::landing(1, pad, 0.0, false),
            MissionItem::landing(2, pad, 0.0, true),
        ]);
        assert_eq!(mission.len(), 3);
        assert!(!mission.is_empty());
    }
}
