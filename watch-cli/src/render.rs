//! Plain-text and JSON drawing of the watch view model.

use std::fmt::Write;
use std::time::Instant;

use serde::Serialize;
use watch_core::grid::{Disclosure, TerrainCell};
use watch_core::watch::NO_CONDITION_MESSAGE;
use watch_core::{ClimatePanel, GridView, WatchApp};

/// Everything on screen, in a shape a browser front end can consume.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub status: &'a str,
    pub can_generate: bool,
    pub rolls: Vec<RollInput>,
    pub climate: Option<&'a ClimatePanel>,
    pub grid: Option<&'a GridView>,
}

#[derive(Debug, Serialize)]
pub struct RollInput {
    pub skill: watch_core::Skill,
    pub value: Option<u32>,
    pub flash: bool,
}

pub fn snapshot(app: &WatchApp, now: Instant) -> Snapshot<'_> {
    let rolls = app
        .rolls()
        .skills()
        .map(|skill| RollInput {
            skill,
            value: app.rolls().get(skill),
            flash: app.rolls().is_flashing(skill, now),
        })
        .collect();
    Snapshot {
        status: app.status(),
        can_generate: app.can_generate(),
        rolls,
        climate: app.climate(),
        grid: app.grid(),
    }
}

pub fn json(app: &WatchApp, now: Instant) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&snapshot(app, now))
}

/// Full text screen: rolls, climate panel, both grids, then the status line.
pub fn text(app: &WatchApp, now: Instant) -> String {
    let snap = snapshot(app, now);
    let mut out = String::new();

    let inputs: Vec<String> = snap
        .rolls
        .iter()
        .map(|input| {
            let value = input
                .value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            let flash = if input.flash { "*" } else { "" };
            format!("{}={}{}", input.skill, value, flash)
        })
        .collect();
    let _ = writeln!(out, "Rolls: {}", inputs.join("  "));

    if let Some(panel) = snap.climate {
        out.push_str(&climate(panel));
    }
    if let Some(grid) = snap.grid {
        out.push_str(&grid_text(grid, app.variant().include_selection));
    }
    let _ = writeln!(out, "Status: {}", snap.status);
    out
}

pub fn climate(panel: &ClimatePanel) -> String {
    let mut out = String::new();
    let marker = if panel.is_active() { "ACTIVE" } else { "none" };
    let _ = writeln!(out, "== Oppressive climate [{}] ==", marker);
    let _ = writeln!(out, "  {}", panel.roll_line());
    match &panel.condition {
        Some(condition) => {
            let _ = writeln!(out, "  {}", condition.name);
            let _ = writeln!(out, "  {}", condition.description);
        }
        None => {
            let _ = writeln!(out, "  {}", NO_CONDITION_MESSAGE);
        }
    }
    out
}

pub fn grid_text(grid: &GridView, with_selection: bool) -> String {
    let mut out = String::new();
    if with_selection {
        let _ = writeln!(out, "== Selected terrains ({}) ==", grid.selected.len());
        for cell in &grid.selected {
            out.push_str(&cell_text(cell));
        }
        let _ = writeln!(out, "== Available terrains ({}) ==", grid.available.len());
    } else {
        let _ = writeln!(out, "== Terrains ({}) ==", grid.available.len());
    }
    for cell in &grid.available {
        out.push_str(&cell_text(cell));
    }
    out
}

fn cell_text(cell: &TerrainCell) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}]  ({})", cell.title, cell.image);
    for check in &cell.checks {
        match check.outcome {
            Some(outcome) => {
                let _ = writeln!(
                    out,
                    "  {:<10} DC {:>2}  roll {:>2}  {}",
                    check.label,
                    check.dc,
                    outcome.roll,
                    outcome.label
                );
            }
            None => {
                let _ = writeln!(out, "  {:<10} DC {:>2}", check.label, check.dc);
            }
        }
    }
    for disclosure in [&cell.velocity, &cell.oppressive].into_iter().flatten() {
        out.push_str(&disclosure_text(disclosure));
    }
    out
}

fn disclosure_text(disclosure: &Disclosure) -> String {
    let (marker, prefix) = match disclosure.kind {
        watch_core::grid::DisclosureKind::Velocity => ("~", "Velocity"),
        watch_core::grid::DisclosureKind::Oppressive => ("!", "Oppressive"),
    };
    let label = if disclosure.toggle == prefix {
        prefix.to_string()
    } else {
        format!("{}: {}", prefix, disclosure.toggle)
    };
    if disclosure.expanded {
        format!("  {} {} (-)\n      {}\n", marker, label, disclosure.body)
    } else {
        format!("  {} {} (+)\n", marker, label)
    }
}
