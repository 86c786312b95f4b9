mod domain;
mod error;
mod infrastructure;

use anyhow::{bail, Context, Result};
use domain::settings::SettingsService;
use infrastructure::bluez::registrar::{self, SessionOptions};
use infrastructure::{logging, sdp};
use std::io::Write;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

const USAGE: &str = "\
usage: ergoblue-profile [register | render-record | help]

  register        read an SDP record from stdin and register it with BlueZ (default)
  render-record   print the HID keyboard SDP record to stdout
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Register,
    RenderRecord,
    Help,
}

impl Command {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut args = args.into_iter();
        let command = match args.next().as_deref() {
            None | Some("register") => Self::Register,
            Some("render-record") => Self::RenderRecord,
            Some("help") | Some("-h") | Some("--help") => Self::Help,
            Some(other) => bail!("unknown command '{}'\n\n{}", other, USAGE),
        };
        if let Some(extra) = args.next() {
            bail!("unexpected argument '{}'\n\n{}", extra, USAGE);
        }
        Ok(command)
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => Some(terminate),
        Err(e) => {
            warn!("Cannot listen for SIGTERM: {}", e);
            None
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Cannot listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        }
        _ = async {
            match terminate.as_mut() {
                Some(terminate) => {
                    terminate.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        } => {}
    }
}

async fn register(settings: &SettingsService) -> Result<()> {
    let settings = settings.get();
    let record = registrar::read_service_record(tokio::io::stdin())
        .await
        .context("Reading service record")?;

    let connection = registrar::connect_system_bus(settings.bus_address.as_deref())
        .await
        .context("Connecting to the system bus")?;

    let options = SessionOptions {
        unregister_on_shutdown: settings.unregister_on_shutdown,
        discoverable_adapter: settings
            .adapter
            .make_discoverable
            .then(|| settings.adapter.name.clone()),
    };
    registrar::run(&connection, record, shutdown_signal(), &options)
        .await
        .context("Registering HID profile")?;

    Ok(())
}

fn render_record(settings: &SettingsService) -> Result<()> {
    let xml = sdp::render_keyboard_record(&settings.get().record);
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(xml.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = Command::parse(std::env::args().skip(1))?;
    if command == Command::Help {
        print!("{}", USAGE);
        return Ok(());
    }

    let settings = SettingsService::new();
    let _log_guard = logging::init_logger(&settings.get().log_settings)?;
    if let Some(path) = settings.path() {
        info!("Settings: {}", path.display());
    }
    if let Some(reason) = settings.load_error() {
        warn!("{}", reason);
    }

    match command {
        Command::Register => register(&settings).await,
        Command::RenderRecord => render_record(&settings),
        Command::Help => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        Command::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_default_command_is_register() {
        assert_eq!(parse(&[]).unwrap(), Command::Register);
        assert_eq!(parse(&["register"]).unwrap(), Command::Register);
    }

    #[test]
    fn test_render_record_command() {
        assert_eq!(parse(&["render-record"]).unwrap(), Command::RenderRecord);
        assert_eq!(parse(&["--help"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_unknown_arguments_rejected() {
        assert!(parse(&["unregister"]).is_err());
        assert!(parse(&["register", "extra"]).is_err());
    }
}
