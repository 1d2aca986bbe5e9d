//! Request validation for the HTTP boundary.
//!
//! Malformed input is rejected here with [`FleetError::ValidationError`] and
//! never reaches the gateway.

use fleetlink_common::{validation_error, DeviceAttributes, FleetError};

pub const MAX_DEVICE_ID_LEN: usize = 128;
pub const MAX_COMMAND_TYPE_LEN: usize = 64;

/// Returns the device id with surrounding whitespace removed.
pub fn device_id(raw: &str) -> Result<&str, FleetError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(validation_error("device_id must not be empty"));
    }
    if id.chars().count() > MAX_DEVICE_ID_LEN {
        return Err(validation_error(format!(
            "device_id must be at most {} characters",
            MAX_DEVICE_ID_LEN
        )));
    }
    Ok(id)
}

pub fn command_type(raw: &str) -> Result<&str, FleetError> {
    let command_type = raw.trim();
    if command_type.is_empty() {
        return Err(validation_error("command_type must not be empty"));
    }
    if command_type.chars().count() > MAX_COMMAND_TYPE_LEN {
        return Err(validation_error(format!(
            "command_type must be at most {} characters",
            MAX_COMMAND_TYPE_LEN
        )));
    }
    Ok(command_type)
}

pub fn attributes(attributes: &DeviceAttributes) -> Result<(), FleetError> {
    match attributes.battery_level {
        Some(level) if !(0..=100).contains(&level) => Err(validation_error(format!(
            "battery_level must be between 0 and 100, got {}",
            level
        ))),
        _ => Ok(()),
    }
}

pub fn log_kind(raw: &str) -> Result<&str, FleetError> {
    let kind = raw.trim();
    if kind.is_empty() {
        return Err(validation_error("kind must not be empty"));
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_is_trimmed_and_bounded() {
        assert_eq!(device_id("  phone-1 "), Ok("phone-1"));
        assert!(device_id("   ").is_err());
        assert!(device_id(&"x".repeat(MAX_DEVICE_ID_LEN)).is_ok());
        assert!(device_id(&"x".repeat(MAX_DEVICE_ID_LEN + 1)).is_err());
    }

    #[test]
    fn command_type_is_bounded() {
        assert_eq!(command_type("ring"), Ok("ring"));
        assert!(command_type("").is_err());
        assert!(command_type(&"y".repeat(MAX_COMMAND_TYPE_LEN + 1)).is_err());
    }

    #[test]
    fn battery_level_must_be_a_percentage() {
        let mut attrs = DeviceAttributes::default();
        assert!(attributes(&attrs).is_ok());

        attrs.battery_level = Some(100);
        assert!(attributes(&attrs).is_ok());

        attrs.battery_level = Some(101);
        assert!(matches!(
            attributes(&attrs),
            Err(FleetError::ValidationError(_))
        ));

        attrs.battery_level = Some(-1);
        assert!(attributes(&attrs).is_err());
    }

    #[test]
    fn blank_log_kind_is_rejected() {
        assert!(log_kind(" \t").is_err());
        assert_eq!(log_kind("sms"), Ok("sms"));
    }
}
