//! Status and state-change commands for a single sauna.

use std::fmt::Write;

use serde::Serialize;
use serde_json::Number;

use harvia_core::{Ack, ActionResponse, Actions, Change, SaunaStatus};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Formatting helpers ──────────────────────────────────────────────

/// "80 °C / 176 °F", or "-" when the device did not report it.
pub(super) fn celsius(c: Option<&Number>, f: Option<f64>) -> String {
    match (c, f) {
        (Some(c), Some(f)) => format!("{c} °C / {f} °F"),
        (Some(c), None) => format!("{c} °C"),
        _ => "-".into(),
    }
}

pub(super) fn percent(value: Option<&Number>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v} %"))
}

fn detail(s: &SaunaStatus, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Device:    {}", s.device_id);
    let _ = writeln!(out, "Name:      {}", s.name.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Power:     {}", output::paint_switch(s.power, color));
    let _ = writeln!(out, "Lights:    {}", output::paint_switch(s.lights, color));
    let _ = writeln!(out, "Steamer:   {}", output::paint_switch(s.steamer, color));
    let _ = writeln!(out, "Fan:       {}", output::paint_switch(s.fan, color));
    let _ = writeln!(
        out,
        "Current:   {}",
        celsius(s.current_temperature_c.as_ref(), s.current_temperature_f)
    );
    let _ = writeln!(
        out,
        "Target:    {}",
        celsius(s.target_temperature_c.as_ref(), s.target_temperature_f)
    );
    let _ = writeln!(out, "Humidity:  {}", percent(s.humidity_pct.as_ref()));
    let _ = writeln!(out, "Target RH: {}", percent(s.target_humidity_pct.as_ref()));
    if let Some(minutes) = s.remaining_time_min {
        let _ = writeln!(out, "Remaining: {minutes} min");
    }
    let door = s.door.map_or_else(|| "-".into(), |d| d.to_string());
    let _ = write!(out, "Door:      {door}");
    out
}

fn summary(ack: &Ack) -> String {
    let what = match ack.change {
        Change::Power { power } => format!("power {power}"),
        Change::Lights { lights } => format!("lights {lights}"),
        Change::Steamer { steamer } => format!("steamer {steamer}"),
        Change::Fan { fan } => format!("fan {fan}"),
        Change::Temperature {
            target_temperature_f,
            target_temperature_c,
        } => format!("target temperature {target_temperature_f} °F ({target_temperature_c} °C)"),
        Change::Humidity {
            target_humidity_pct,
        } => format!("target humidity {target_humidity_pct} %"),
    };
    format!("✓ {}: {what}", ack.device_id)
}

/// Unwrap an action response. Structured formats still get the
/// `{"error": ...}` object on stdout before the process fails.
pub(super) fn accept<T: Serialize>(
    response: ActionResponse<T>,
    global: &GlobalOpts,
) -> Result<T, CliError> {
    match response {
        ActionResponse::Ok(value) => Ok(value),
        ActionResponse::Error { .. } if output::is_structured(&global.output) => {
            let out = output::render_single(&global.output, &response, |_| String::new(), |_| {
                String::new()
            });
            output::print_output(&out, global.quiet);
            Err(action_failed(response))
        }
        ActionResponse::Error { .. } => Err(action_failed(response)),
    }
}

fn action_failed<T>(response: ActionResponse<T>) -> CliError {
    CliError::ActionFailed {
        message: response.error().unwrap_or_default().to_owned(),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn status(
    actions: &Actions,
    device: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status = accept(actions.get_status(device).await, global)?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &status,
        |s| detail(s, color),
        |s| s.device_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print the acknowledgement of a state change.
pub fn acknowledge(response: ActionResponse<Ack>, global: &GlobalOpts) -> Result<(), CliError> {
    let ack = accept(response, global)?;
    let out = output::render_single(&global.output, &ack, summary, |a| a.device_id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
