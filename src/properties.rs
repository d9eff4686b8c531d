use serde_json::Value;

/// Operation status (power).
pub const POWER: &str = "80";
/// Operation mode (auto/cool/heat/dry/fan).
pub const OPERATION_MODE: &str = "B0";
/// Target temperature in Celsius.
pub const TARGET_TEMPERATURE: &str = "B3";
/// Measured room temperature in Celsius. Read only.
pub const ROOM_TEMPERATURE: &str = "BB";
/// Air flow (wind speed) level.
pub const WINDSPEED: &str = "A0";
/// Vertical air flow direction.
pub const FAN_DIRECTION: &str = "A4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn as_vendor_str(&self) -> &'static str {
        match self {
            PowerState::On => "30",
            PowerState::Off => "31",
        }
    }

    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "30" => Some(PowerState::On),
            "31" => Some(PowerState::Off),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Auto,
    Cool,
    Heat,
    Dehumidify,
    Ventilation,
    Other,
}

impl OperationMode {
    pub fn as_vendor_str(&self) -> &'static str {
        match self {
            OperationMode::Auto => "41",
            OperationMode::Cool => "42",
            OperationMode::Heat => "43",
            OperationMode::Dehumidify => "44",
            OperationMode::Ventilation => "45",
            OperationMode::Other => "40",
        }
    }

    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "41" => Some(OperationMode::Auto),
            "42" => Some(OperationMode::Cool),
            "43" => Some(OperationMode::Heat),
            "44" => Some(OperationMode::Dehumidify),
            "45" => Some(OperationMode::Ventilation),
            "40" => Some(OperationMode::Other),
            _ => None,
        }
    }
}

/// Wind speed: automatic, or a fixed level from 1 (lowest) to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindSpeed {
    Auto,
    Level(u8),
}

impl WindSpeed {
    pub const MAX_LEVEL: u8 = 8;

    pub fn level(n: u8) -> Option<Self> {
        (1..=Self::MAX_LEVEL).contains(&n).then_some(WindSpeed::Level(n))
    }

    pub fn as_vendor_str(&self) -> String {
        match self {
            WindSpeed::Auto => "41".to_string(),
            WindSpeed::Level(n) => format!("{}", 30 + *n as u16),
        }
    }

    pub fn from_vendor_str(s: &str) -> Option<Self> {
        if s == "41" {
            return Some(WindSpeed::Auto);
        }
        let n: u16 = s.parse().ok()?;
        let level = n.checked_sub(30)?;
        u8::try_from(level).ok().and_then(WindSpeed::level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDirection {
    Auto,
    Position(u8),
    Swing,
}

impl FanDirection {
    pub const POSITIONS: u8 = 5;

    pub fn as_vendor_str(&self) -> String {
        match self {
            FanDirection::Auto => "41".to_string(),
            FanDirection::Swing => "42".to_string(),
            FanDirection::Position(n) => format!("{}", 30 + *n as u16),
        }
    }

    pub fn from_vendor_str(s: &str) -> Option<Self> {
        match s {
            "41" => Some(FanDirection::Auto),
            "42" => Some(FanDirection::Swing),
            other => {
                let n: u16 = other.parse().ok()?;
                let pos = u8::try_from(n.checked_sub(30)?).ok()?;
                (1..=Self::POSITIONS)
                    .contains(&pos)
                    .then_some(FanDirection::Position(pos))
            }
        }
    }
}

/// Pull the control identifiers out of a vendor control response.
///
/// Responses look like `{"controlList": [{"id": "..."}, ...]}`. Entries
/// without an id are skipped; numeric ids are stringified.
pub fn parse_control_ids(response: &Value) -> Vec<String> {
    let list = match response.get("controlList") {
        Some(Value::Array(list)) => list,
        _ => return vec![],
    };
    list.iter()
        .filter_map(|control| match control.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn windspeed_levels() {
        assert_eq!(WindSpeed::from_vendor_str("31"), Some(WindSpeed::Level(1)));
        assert_eq!(WindSpeed::from_vendor_str("38"), Some(WindSpeed::Level(8)));
        assert_eq!(WindSpeed::from_vendor_str("41"), Some(WindSpeed::Auto));
        assert_eq!(WindSpeed::from_vendor_str("39"), None);
        assert_eq!(WindSpeed::from_vendor_str("30"), None);
        assert_eq!(WindSpeed::from_vendor_str("xx"), None);
        assert_eq!(WindSpeed::Level(4).as_vendor_str(), "34");
        assert_eq!(WindSpeed::level(9), None);
    }

    #[test]
    fn fan_direction_codes() {
        assert_eq!(FanDirection::from_vendor_str("42"), Some(FanDirection::Swing));
        assert_eq!(
            FanDirection::from_vendor_str("33"),
            Some(FanDirection::Position(3))
        );
        assert_eq!(FanDirection::from_vendor_str("36"), None);
        assert_eq!(FanDirection::Position(5).as_vendor_str(), "35");
    }

    #[test]
    fn operation_mode_codes() {
        for mode in [
            OperationMode::Auto,
            OperationMode::Cool,
            OperationMode::Heat,
            OperationMode::Dehumidify,
            OperationMode::Ventilation,
            OperationMode::Other,
        ] {
            assert_eq!(OperationMode::from_vendor_str(mode.as_vendor_str()), Some(mode));
        }
        assert_eq!(PowerState::from_vendor_str("31"), Some(PowerState::Off));
    }

    #[test]
    fn control_ids_from_response() {
        let resp = json!({"controlList": [{"id": "abc"}, {"status": "x"}, {"id": 17}]});
        assert_eq!(parse_control_ids(&resp), vec!["abc".to_string(), "17".to_string()]);
    }

    #[test]
    fn control_ids_missing_list() {
        assert!(parse_control_ids(&json!({})).is_empty());
        assert!(parse_control_ids(&json!({"controlList": "bad"})).is_empty());
        assert!(parse_control_ids(&Value::Null).is_empty());
    }
}
