//! Command dispatch: bridges CLI args -> core actions -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod sauna;

use harvia_core::Actions;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
///
/// `device` is the already-resolved `--device`/profile device; `None`
/// lets the action pick the first device on the account.
pub async fn dispatch(
    cmd: Command,
    actions: &Actions,
    global: &GlobalOpts,
    device: Option<&str>,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(_) => devices::handle(actions, global).await,
        Command::Status => sauna::status(actions, device, global).await,
        Command::On => sauna::acknowledge(actions.turn_on(device).await, global),
        Command::Off => sauna::acknowledge(actions.turn_off(device).await, global),
        Command::Temp(args) => sauna::acknowledge(
            actions.set_temperature(args.fahrenheit, device).await,
            global,
        ),
        Command::Lights(args) => sauna::acknowledge(
            actions.toggle_lights(args.state.is_on(), device).await,
            global,
        ),
        Command::Steamer(args) => sauna::acknowledge(
            actions.toggle_steamer(args.state.is_on(), device).await,
            global,
        ),
        Command::Fan(args) => sauna::acknowledge(
            actions.toggle_fan(args.state.is_on(), device).await,
            global,
        ),
        Command::Humidity(args) => sauna::acknowledge(
            actions.set_humidity(args.percent, device).await,
            global,
        ),
        // Config, Completions and Mcp are handled before dispatch
        Command::Config(_) | Command::Completions(_) | Command::Mcp => unreachable!(),
    }
}
