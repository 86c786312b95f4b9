//! HID Profile Registration Model
//!
//! The fixed identity under which the service record is registered with
//! BlueZ, and the options passed alongside it.

use std::collections::HashMap;
use zbus::zvariant::Value;

/// Object path of this profile instance on the bus
pub const PROFILE_PATH: &str = "/org/bluez/ergoblue";

/// Human Interface Device profile class UUID (0x1124 on the Bluetooth base UUID)
pub const HID_PROFILE_UUID: &str = "00001124-0000-1000-8000-00805f9b34fb";

/// Role BlueZ should take for this profile
pub const ROLE_SERVER: &str = "server";

/// SDP record read from standard input.
///
/// Kept exactly as read: no trimming, no validation. Whether the XML is
/// acceptable is decided by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceRecord(String);

impl ServiceRecord {
    pub fn new(xml: impl Into<String>) -> Self {
        Self(xml.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn byte_len(&self) -> usize {
        self.0.len()
    }
}

/// Options for `ProfileManager1.RegisterProfile`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOptions {
    pub service_record: ServiceRecord,
    pub role: &'static str,
    pub require_authentication: bool,
    pub require_authorization: bool,
}

impl RegistrationOptions {
    /// Options for a HID server carrying `record`
    pub fn hid_server(record: ServiceRecord) -> Self {
        Self {
            service_record: record,
            role: ROLE_SERVER,
            require_authentication: false,
            require_authorization: false,
        }
    }

    /// Build the `a{sv}` dictionary expected by BlueZ
    pub fn to_dict(&self) -> HashMap<&'static str, Value<'_>> {
        HashMap::from([
            ("ServiceRecord", Value::from(self.service_record.as_str())),
            ("Role", Value::from(self.role)),
            (
                "RequireAuthentication",
                Value::from(self.require_authentication),
            ),
            (
                "RequireAuthorization",
                Value::from(self.require_authorization),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_server_options() {
        let options = RegistrationOptions::hid_server(ServiceRecord::new("<record/>"));
        assert_eq!(options.role, "server");
        assert!(!options.require_authentication);
        assert!(!options.require_authorization);
        assert_eq!(options.service_record.as_str(), "<record/>");
    }

    #[test]
    fn test_dict_has_exactly_four_entries() {
        let options = RegistrationOptions::hid_server(ServiceRecord::new("<record/>"));
        let dict = options.to_dict();

        assert_eq!(dict.len(), 4);
        assert_eq!(dict["ServiceRecord"], Value::from("<record/>"));
        assert_eq!(dict["Role"], Value::from("server"));
        assert_eq!(dict["RequireAuthentication"], Value::from(false));
        assert_eq!(dict["RequireAuthorization"], Value::from(false));
    }

    #[test]
    fn test_record_is_not_trimmed() {
        let record = ServiceRecord::new("  <record/>\n\n");
        assert_eq!(record.as_str(), "  <record/>\n\n");
        assert_eq!(record.byte_len(), 13);
    }

    #[test]
    fn test_uuid_is_hid_class() {
        assert!(HID_PROFILE_UUID.starts_with("00001124-"));
        assert_eq!(PROFILE_PATH, "/org/bluez/ergoblue");
    }
}
