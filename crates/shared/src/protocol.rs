use serde::{Deserialize, Serialize};

use crate::{
    domain::{ControlConfig, ControlMode, Orientation, SystemState},
    error::ProtocolError,
};

/// Partial configuration update. Each field independently overwrites
/// the stored value only when present; an absent (or explicitly null)
/// field means "no change", never "reset to default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_mode: Option<ControlMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_orientation: Option<Orientation>,
}

impl ConfigPatch {
    pub fn mode(mode: ControlMode) -> Self {
        Self {
            control_mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn orientation(orientation: Orientation) -> Self {
        Self {
            manual_orientation: Some(orientation),
            ..Self::default()
        }
    }

    /// Last-non-null-wins per-field merge into the stored config.
    pub fn apply_to(&self, config: &mut ControlConfig) {
        if let Some(mode) = self.control_mode {
            config.control_mode = mode;
        }
        if let Some(orientation) = self.manual_orientation {
            config.manual_orientation = orientation;
        }
    }
}

/// Inbound message envelope: `{"event": ..., "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ClientEvent {
    #[serde(rename = "UPDATE_CONFIG")]
    UpdateConfig(ConfigPatch),
    #[serde(rename = "UPDATE_STATE")]
    UpdateState(SystemState),
}

impl ClientEvent {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Outbound message envelope. Config fanout always carries the full
/// merged configuration, never a partial one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "UPDATE_CONFIG")]
    UpdateConfig(ControlConfig),
    #[serde(rename = "UPDATE_STATE")]
    UpdateState(SystemState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config_with_mode_only() {
        let event =
            ClientEvent::parse(r#"{"event":"UPDATE_CONFIG","payload":{"controlMode":"MANUAL"}}"#)
                .expect("parse");
        match event {
            ClientEvent::UpdateConfig(patch) => {
                assert_eq!(patch.control_mode, Some(ControlMode::Manual));
                assert_eq!(patch.manual_orientation, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn explicit_null_field_parses_as_absent() {
        let event = ClientEvent::parse(
            r#"{"event":"UPDATE_CONFIG","payload":{"controlMode":null,"manualOrientation":{"azimuth":10,"inclination":5}}}"#,
        )
        .expect("parse");
        match event {
            ClientEvent::UpdateConfig(patch) => {
                assert_eq!(patch.control_mode, None);
                assert_eq!(
                    patch.manual_orientation,
                    Some(Orientation::new(10.0, 5.0))
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_kind_is_a_protocol_error() {
        assert!(ClientEvent::parse(r#"{"event":"REBOOT","payload":{}}"#).is_err());
        assert!(ClientEvent::parse("not json at all").is_err());
    }

    #[test]
    fn server_config_event_uses_the_documented_envelope() {
        let config = ControlConfig {
            control_mode: ControlMode::Manual,
            manual_orientation: Orientation::new(45.0, 10.0),
        };
        let encoded = serde_json::to_value(ServerEvent::UpdateConfig(config)).expect("json");
        assert_eq!(encoded["event"], "UPDATE_CONFIG");
        assert_eq!(encoded["payload"]["controlMode"], "MANUAL");
        assert_eq!(encoded["payload"]["manualOrientation"]["azimuth"], 45.0);
        assert_eq!(encoded["payload"]["manualOrientation"]["inclination"], 10.0);
    }

    #[test]
    fn patch_merge_leaves_absent_fields_untouched() {
        let mut config = ControlConfig::default();
        ConfigPatch::orientation(Orientation::new(10.0, 5.0)).apply_to(&mut config);
        assert_eq!(config.control_mode, ControlMode::Manual);
        assert_eq!(config.manual_orientation, Orientation::new(10.0, 5.0));

        ConfigPatch::mode(ControlMode::Automatic).apply_to(&mut config);
        assert_eq!(config.control_mode, ControlMode::Automatic);
        assert_eq!(config.manual_orientation, Orientation::new(10.0, 5.0));
    }
}
