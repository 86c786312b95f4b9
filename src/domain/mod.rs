pub mod hid;
pub mod profile;
pub mod settings;
