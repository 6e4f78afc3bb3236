//! Device listing.

use tabled::Tabled;

use harvia_core::{Actions, SaunaStatus};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::sauna::{accept, celsius, percent};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Door")]
    door: String,
}

impl DeviceRow {
    fn new(s: &SaunaStatus, color: bool) -> Self {
        Self {
            id: s.device_id.clone(),
            name: s.name.clone().unwrap_or_default(),
            power: output::paint_switch(s.power, color),
            current: celsius(s.current_temperature_c.as_ref(), s.current_temperature_f),
            target: celsius(s.target_temperature_c.as_ref(), s.target_temperature_f),
            humidity: percent(s.humidity_pct.as_ref()),
            door: s.door.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(actions: &Actions, global: &GlobalOpts) -> Result<(), CliError> {
    let listing = accept(actions.device_listing().await, global)?;

    for skipped in &listing.skipped {
        eprintln!("warning: skipped {}: {}", skipped.device_id, skipped.error);
    }

    let statuses: Vec<SaunaStatus> = listing.devices.iter().map(SaunaStatus::from).collect();
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &statuses,
        |s| DeviceRow::new(s, color),
        |s| s.device_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
