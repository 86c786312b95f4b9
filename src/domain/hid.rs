//! HID report descriptor of the keyboard.
//!
//! Two top-level collections: a boot-style keyboard on report id 1 and a
//! consumer control page on report id 2.

#[rustfmt::skip]
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01,       // Usage Page (Generic Desktop Ctrls)
    0x09, 0x06,       // Usage (Keyboard)
    0xa1, 0x01,       // Collection (Application)
    0x85, 0x01,       //   Report ID (1)
    0x95, 0x08,       //   Report Count (8)
    0x75, 0x01,       //   Report Size (1)
    0x05, 0x07,       //   Usage Page (Kbrd/Keypad)
    0x19, 0xe0,       //   Usage Minimum (0xE0)
    0x29, 0xe7,       //   Usage Maximum (0xE7)
    0x15, 0x00,       //   Logical Minimum (0)
    0x25, 0x01,       //   Logical Maximum (1)
    0x81, 0x02,       //   Input (Data,Var,Abs)
    0x95, 0x06,       //   Report Count (6)
    0x75, 0x08,       //   Report Size (8)
    0x15, 0x00,       //   Logical Minimum (0)
    0x25, 0xff,       //   Logical Maximum (255)
    0x05, 0x07,       //   Usage Page (Kbrd/Keypad)
    0x19, 0x00,       //   Usage Minimum (0x00)
    0x29, 0xff,       //   Usage Maximum (0xFF)
    0x81, 0x00,       //   Input (Data,Array,Abs)
    0xc0,             // End Collection
    0x05, 0x0c,       // Usage Page (Consumer)
    0x09, 0x01,       // Usage (Consumer Control)
    0xa1, 0x01,       // Collection (Application)
    0x85, 0x02,       //   Report ID (2)
    0x95, 0x01,       //   Report Count (1)
    0x75, 0x10,       //   Report Size (16)
    0x15, 0x01,       //   Logical Minimum (1)
    0x26, 0x9c, 0x02, //   Logical Maximum (668)
    0x19, 0x01,       //   Usage Minimum (Consumer Control)
    0x2a, 0x9c, 0x02, //   Usage Maximum (AC Distribute Vertically)
    0x81, 0x00,       //   Input (Data,Array,Abs)
    0xc0,             // End Collection
];

/// Lowercase hex encoding, as BlueZ expects for `encoding="hex"` text
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_collections_balanced() {
        let opened = KEYBOARD_REPORT_DESCRIPTOR
            .windows(2)
            .filter(|w| *w == [0xa1, 0x01])
            .count();
        let closed = KEYBOARD_REPORT_DESCRIPTOR
            .iter()
            .filter(|b| **b == 0xc0)
            .count();
        assert_eq!(opened, 2);
        assert_eq!(closed, 2);
    }

    #[test]
    fn test_descriptor_report_ids() {
        let ids: Vec<u8> = KEYBOARD_REPORT_DESCRIPTOR
            .windows(2)
            .filter(|w| w[0] == 0x85)
            .map(|w| w[1])
            .collect();
        // keyboard, then consumer control
        assert_eq!(ids, vec![0x01, 0x02]);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x05, 0x01, 0xff]), "0501ff");
        assert_eq!(to_hex(&[]), "");
        assert!(to_hex(KEYBOARD_REPORT_DESCRIPTOR).starts_with("05010906a101"));
    }
}
