//! Poweroff with confirmation.

use filmdeck_core::{Controller, DeviceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::util;

pub async fn handle(device: DeviceConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = Controller::new(device)?;
    controller.refresh().await?;

    // Opens the gate; refused while a scan runs.
    controller.request_poweroff()?;

    if !util::confirm(
        "poweroff",
        "Power off the scanner? It cannot be switched back on remotely.",
        global.yes,
    )? {
        controller.abort_poweroff();
        return Err(CliError::Cancelled {
            action: "poweroff".into(),
        });
    }

    controller.confirm_poweroff().await?;
    util::done("Scanner is powering off", global);
    Ok(())
}
