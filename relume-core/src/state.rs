//! High-level device state as reported by the voice pipeline
//!
//! The poller never drives these transitions; it only reads the current
//! state once per iteration to gate network work and update labels.

/// Device states published by the external voice/assistant pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Power-on, nothing brought up yet
    Starting,
    /// Captive-portal Wi-Fi provisioning in progress
    WifiConfiguring,
    /// Opening a connection to the assistant backend
    Connecting,
    /// Microphone open, capturing a request
    Listening,
    /// Playing back an assistant reply
    Speaking,
    /// Connected and quiet
    Idle,
    /// Firmware upgrade in progress
    Upgrading,
    /// Device activation / pairing flow
    Activating,
    /// Unrecoverable error reported by the pipeline
    FatalError,
    /// State not yet published
    Unknown,
}

impl DeviceState {
    /// Whether the network stack can be assumed usable in this state
    pub fn network_connected(&self) -> bool {
        !matches!(
            self,
            DeviceState::Starting | DeviceState::WifiConfiguring | DeviceState::Unknown
        )
    }

    /// Whether a voice session is in flight (gates non-critical refresh)
    pub fn voice_session_active(&self) -> bool {
        matches!(
            self,
            DeviceState::Connecting | DeviceState::Listening | DeviceState::Speaking
        )
    }

    /// Short label shown in the emotion area of the chat card
    pub fn emotion_text(&self) -> &'static str {
        match self {
            DeviceState::Connecting => "link",
            DeviceState::Listening => "ears",
            DeviceState::Speaking => "talk",
            DeviceState::Starting => "boot",
            DeviceState::WifiConfiguring => "wifi",
            DeviceState::Upgrading => "update",
            DeviceState::Activating => "pair",
            DeviceState::FatalError => "error",
            DeviceState::Idle | DeviceState::Unknown => "standby",
        }
    }

    /// Status line for the chat card, when this state owns it
    ///
    /// Speaking, WifiConfiguring and Activating keep whatever the
    /// chat/alert path last wrote, so they return `None` here.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            DeviceState::Connecting => Some("Connecting..."),
            DeviceState::Listening => Some("Listening..."),
            DeviceState::Starting => Some("Starting..."),
            DeviceState::Upgrading => Some("Updating..."),
            DeviceState::FatalError => Some("Something went wrong"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_gating() {
        assert!(!DeviceState::Starting.network_connected());
        assert!(!DeviceState::WifiConfiguring.network_connected());
        assert!(!DeviceState::Unknown.network_connected());
        assert!(DeviceState::Idle.network_connected());
        assert!(DeviceState::Speaking.network_connected());
        assert!(DeviceState::FatalError.network_connected());
    }

    #[test]
    fn session_states() {
        assert!(DeviceState::Connecting.voice_session_active());
        assert!(DeviceState::Listening.voice_session_active());
        assert!(DeviceState::Speaking.voice_session_active());
        assert!(!DeviceState::Idle.voice_session_active());
        assert!(!DeviceState::Upgrading.voice_session_active());
    }

    #[test]
    fn speaking_keeps_chat_text() {
        assert_eq!(DeviceState::Speaking.status_text(), None);
        assert_eq!(DeviceState::Activating.status_text(), None);
        assert_eq!(DeviceState::Listening.status_text(), Some("Listening..."));
    }
}
