//! SDP Record Rendering
//!
//! Builds Bluetooth service discovery records and renders them in the XML
//! dialect accepted by BlueZ's `ServiceRecord` option.
//!
//! # Record layout
//!
//! ```text
//! <record>
//!   <attribute id="0x0001">      one attribute per id, ascending
//!     <sequence>                 data elements nest as in SDP
//!       <uuid value="0x1124" />
//!     </sequence>
//!   </attribute>
//! </record>
//! ```

use crate::domain::hid;
use crate::domain::settings::RecordSettings;
use std::fmt::Write;

/// L2CAP protocol UUID
pub const UUID_L2CAP: u16 = 0x0100;
/// HIDP protocol UUID
pub const UUID_HIDP: u16 = 0x0011;
/// Human Interface Device service class
pub const UUID_HID_SERVICE: u16 = 0x1124;
/// Public browse root group
pub const UUID_PUBLIC_BROWSE_GROUP: u16 = 0x1002;

/// L2CAP PSM of the HID control channel
pub const PSM_HID_CONTROL: u16 = 0x0011;
/// L2CAP PSM of the HID interrupt channel
pub const PSM_HID_INTERRUPT: u16 = 0x0013;

/// A single SDP data element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataElement {
    Uint8(u8),
    Uint16(u16),
    Uuid16(u16),
    Boolean(bool),
    Text(String),
    /// Binary text, written hex encoded
    HexText(Vec<u8>),
    Sequence(Vec<DataElement>),
}

impl DataElement {
    pub fn seq(items: impl IntoIterator<Item = DataElement>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }

    fn write_xml(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        // Writing into a String cannot fail
        let _ = match self {
            Self::Uint8(v) => writeln!(out, "{indent}<uint8 value=\"0x{v:02x}\" />"),
            Self::Uint16(v) => writeln!(out, "{indent}<uint16 value=\"0x{v:04x}\" />"),
            Self::Uuid16(v) => writeln!(out, "{indent}<uuid value=\"0x{v:04x}\" />"),
            Self::Boolean(v) => writeln!(out, "{indent}<boolean value=\"{v}\" />"),
            Self::Text(v) => writeln!(out, "{indent}<text value=\"{}\" />", escape_xml(v)),
            Self::HexText(v) => writeln!(
                out,
                "{indent}<text encoding=\"hex\" value=\"{}\" />",
                hid::to_hex(v)
            ),
            Self::Sequence(items) => {
                let _ = writeln!(out, "{indent}<sequence>");
                for item in items {
                    item.write_xml(out, depth + 1);
                }
                writeln!(out, "{indent}</sequence>")
            }
        };
    }
}

/// An attribute id with its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: u16,
    pub value: DataElement,
}

/// A full service record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdpRecord {
    attributes: Vec<Attribute>,
}

impl SdpRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value with the same id
    pub fn with(mut self, id: u16, value: DataElement) -> Self {
        self.attributes.retain(|attr| attr.id != id);
        self.attributes.push(Attribute { id, value });
        self
    }

    #[cfg(test)]
    fn attribute(&self, id: u16) -> Option<&DataElement> {
        self.attributes
            .iter()
            .find(|attr| attr.id == id)
            .map(|attr| &attr.value)
    }

    /// Render as BlueZ SDP XML, attributes in ascending id order
    pub fn to_xml(&self) -> String {
        let mut attributes: Vec<&Attribute> = self.attributes.iter().collect();
        attributes.sort_by_key(|attr| attr.id);

        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<record>\n");
        for attr in attributes {
            let _ = writeln!(out, "  <attribute id=\"0x{:04x}\">", attr.id);
            attr.value.write_xml(&mut out, 2);
            out.push_str("  </attribute>\n");
        }
        out.push_str("</record>\n");
        out
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn l2cap_hidp(psm: u16) -> DataElement {
    use DataElement::*;

    DataElement::seq([
        DataElement::seq([Uuid16(UUID_L2CAP), Uint16(psm)]),
        DataElement::seq([Uuid16(UUID_HIDP)]),
    ])
}

/// HID keyboard record advertising `report_descriptor`
///
/// Control channel on PSM 0x11, interrupt channel on PSM 0x13.
pub fn hid_keyboard_record(report_descriptor: &[u8], names: &RecordSettings) -> SdpRecord {
    use DataElement::*;

    SdpRecord::new()
        // ServiceClassIDList
        .with(0x0001, DataElement::seq([Uuid16(UUID_HID_SERVICE)]))
        // ProtocolDescriptorList
        .with(0x0004, l2cap_hidp(PSM_HID_CONTROL))
        // BrowseGroupList
        .with(0x0005, DataElement::seq([Uuid16(UUID_PUBLIC_BROWSE_GROUP)]))
        // LanguageBaseAttributeIDList: "en", UTF-8, base 0x0100
        .with(
            0x0006,
            DataElement::seq([Uint16(0x656e), Uint16(0x006a), Uint16(0x0100)]),
        )
        // BluetoothProfileDescriptorList: HID 1.0
        .with(
            0x0009,
            DataElement::seq([DataElement::seq([Uuid16(UUID_HID_SERVICE), Uint16(0x0100)])]),
        )
        // AdditionalProtocolDescriptorLists
        .with(0x000d, DataElement::seq([l2cap_hidp(PSM_HID_INTERRUPT)]))
        .with(0x0100, Text(names.service_name.clone()))
        .with(0x0101, Text(names.description.clone()))
        .with(0x0102, Text(names.provider.clone()))
        // HIDDeviceReleaseNumber
        .with(0x0200, Uint16(0x0100))
        // HIDParserVersion
        .with(0x0201, Uint16(0x0111))
        // HIDDeviceSubclass: keyboard
        .with(0x0202, Uint8(0x40))
        // HIDCountryCode
        .with(0x0203, Uint8(0x00))
        // HIDVirtualCable
        .with(0x0204, Boolean(true))
        // HIDReconnectInitiate
        .with(0x0205, Boolean(true))
        // HIDDescriptorList: report descriptor (0x22)
        .with(
            0x0206,
            DataElement::seq([DataElement::seq([
                Uint8(0x22),
                HexText(report_descriptor.to_vec()),
            ])]),
        )
        // HIDLANGIDBaseList: en-US
        .with(
            0x0207,
            DataElement::seq([DataElement::seq([Uint16(0x0409), Uint16(0x0100)])]),
        )
        // HIDProfileVersion
        .with(0x020b, Uint16(0x0100))
        // HIDSupervisionTimeout
        .with(0x020c, Uint16(0x0c80))
        // HIDNormallyConnectable
        .with(0x020d, Boolean(true))
        // HIDBootDevice
        .with(0x020e, Boolean(false))
        // HIDSSRHostMaxLatency
        .with(0x020f, Uint16(0x0640))
        // HIDSSRHostMinTimeout
        .with(0x0210, Uint16(0x0320))
}

/// XML for the built-in keyboard descriptor
pub fn render_keyboard_record(names: &RecordSettings) -> String {
    hid_keyboard_record(hid::KEYBOARD_REPORT_DESCRIPTOR, names).to_xml()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & <b> \"c\""), "a &amp; &lt;b&gt; &quot;c&quot;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_with_replaces_existing_attribute() {
        let record = SdpRecord::new()
            .with(0x0100, DataElement::Text("one".into()))
            .with(0x0100, DataElement::Text("two".into()));
        assert_eq!(record.to_xml().matches("id=\"0x0100\"").count(), 1);
        assert_eq!(
            record.attribute(0x0100),
            Some(&DataElement::Text("two".into()))
        );
    }

    #[test]
    fn test_attributes_rendered_in_id_order() {
        let xml = SdpRecord::new()
            .with(0x0200, DataElement::Uint16(1))
            .with(0x0001, DataElement::seq([DataElement::Uuid16(0x1124)]))
            .to_xml();
        let first = xml.find("id=\"0x0001\"").unwrap();
        let second = xml.find("id=\"0x0200\"").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_nested_sequence_xml() {
        let xml = SdpRecord::new()
            .with(
                0x0009,
                DataElement::seq([DataElement::seq([
                    DataElement::Uuid16(0x1124),
                    DataElement::Uint16(0x0100),
                ])]),
            )
            .to_xml();
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\" ?>
<record>
  <attribute id=\"0x0009\">
    <sequence>
      <sequence>
        <uuid value=\"0x1124\" />
        <uint16 value=\"0x0100\" />
      </sequence>
    </sequence>
  </attribute>
</record>
";
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_keyboard_record_channels() {
        let record = hid_keyboard_record(&[0x05, 0x01], &RecordSettings::default());
        assert_eq!(record.attribute(0x0004), Some(&l2cap_hidp(PSM_HID_CONTROL)));
        assert_eq!(
            record.attribute(0x000d),
            Some(&DataElement::seq([l2cap_hidp(PSM_HID_INTERRUPT)]))
        );
        assert_eq!(record.attribute(0x0202), Some(&DataElement::Uint8(0x40)));
    }

    #[test]
    fn test_keyboard_record_embeds_descriptor() {
        let names = RecordSettings {
            service_name: "Left & Right".to_string(),
            ..RecordSettings::default()
        };
        let xml = render_keyboard_record(&names);

        assert!(xml.contains(&format!(
            "<text encoding=\"hex\" value=\"{}\" />",
            hid::to_hex(hid::KEYBOARD_REPORT_DESCRIPTOR)
        )));
        assert!(xml.contains("<text value=\"Left &amp; Right\" />"));
        assert!(xml.contains("<uuid value=\"0x1124\" />"));
        assert!(xml.trim_end().ends_with("</record>"));
    }
}
