use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("failed to read service record from stdin")]
    StdinRead(#[source] std::io::Error),

    #[error("failed to connect to D-Bus")]
    BusConnect(#[source] zbus::Error),

    #[error("failed to export profile object at {path}")]
    Export {
        path: String,
        #[source]
        source: zbus::Error,
    },

    #[error("failed to make adapter {adapter} discoverable")]
    Adapter {
        adapter: String,
        #[source]
        source: zbus::Error,
    },

    #[error("RegisterProfile rejected: {name}: {message}")]
    Registration { name: String, message: String },

    #[error("UnregisterProfile failed: {name}: {message}")]
    Unregistration { name: String, message: String },
}

/// Split a zbus error into the remote error name and message
pub fn describe_remote(err: &zbus::Error) -> (String, String) {
    match err {
        zbus::Error::MethodError(name, message, _) => (
            name.as_str().to_string(),
            message.clone().unwrap_or_default(),
        ),
        zbus::Error::FDO(fdo) => ("org.freedesktop.DBus.Error".to_string(), fdo.to_string()),
        other => ("transport".to_string(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_message() {
        let err = RegistrarError::Registration {
            name: "org.bluez.Error.AlreadyExists".to_string(),
            message: "Already Exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RegisterProfile rejected: org.bluez.Error.AlreadyExists: Already Exists"
        );
    }

    #[test]
    fn test_describe_transport_error() {
        let (name, message) = describe_remote(&zbus::Error::InvalidReply);
        assert_eq!(name, "transport");
        assert!(!message.is_empty());
    }
}
