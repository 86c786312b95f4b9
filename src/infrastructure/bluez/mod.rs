//! BlueZ Module
//!
//! Registers the HID service record with the BlueZ daemon over D-Bus.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  ProfileRegistrar                     │
//! │  (reads the record, registers, holds until shutdown)  │
//! └───────────────┬──────────────────────┬───────────────┘
//!                 │                      │
//!                 ▼                      ▼
//!      ┌─────────────────────┐  ┌─────────────────────┐
//!      │ ProfileManager1     │  │ HidProfile          │
//!      │ (proxy, outgoing)   │  │ (Profile1, incoming)│
//!      │ - RegisterProfile   │  │ - NewConnection     │
//!      │ - UnregisterProfile │  │ - Release           │
//!      └─────────────────────┘  └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`proxy`] - `org.bluez.ProfileManager1` client proxy
//! - [`profile`] - `org.bluez.Profile1` object served at the profile path
//! - [`registrar`] - Registration flow

pub mod profile;
pub mod proxy;
pub mod registrar;
