use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    fmt::FormattedPercentage,
    pv::tower::TowerGeometry,
    quantity::{
        Zero,
        energy::{KilowattHours, WattHours},
        power::Watts,
    },
    report::{Period, Summary, WeatherSummary},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn energy_cell(energy: WattHours) -> Cell {
    Cell::new(format!("{:.1}", KilowattHours::from(energy))).set_alignment(CellAlignment::Right)
}

fn ratio_cell(ratio: Option<f64>) -> Cell {
    let color = match ratio {
        Some(ratio) if ratio >= 0.8 => Color::Green,
        Some(ratio) if ratio >= 0.4 => Color::DarkYellow,
        Some(_) => Color::Red,
        None => Color::Reset,
    };
    Cell::new(FormattedPercentage(ratio)).set_alignment(CellAlignment::Right).fg(color)
}

/// Energy balance per period, with the optional total row.
pub fn build_summary_table(
    rows: impl IntoIterator<Item = (Period, Summary)>,
    total: Option<&Summary>,
) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Period",
        "PV",
        "Load",
        "Direct",
        "Charged",
        "Discharged",
        "Losses",
        "Grid",
        "Unserved",
        "Curtailed",
        "Peak PV",
        "PV/day",
        "Cycles",
        "Self-sufficiency",
        "Self-consumption",
    ]);
    let rows = rows.into_iter().map(|(period, summary)| (Cell::new(period), summary));
    let total = total.map(|summary| (Cell::new("Total").add_attribute(Attribute::Bold), *summary));
    for (label, summary) in rows.chain(total) {
        table.add_row(vec![
            label,
            energy_cell(summary.pv_production).fg(Color::Yellow),
            energy_cell(summary.load),
            energy_cell(summary.pv_direct).add_attribute(Attribute::Dim),
            energy_cell(summary.charged).add_attribute(Attribute::Dim),
            energy_cell(summary.discharged).add_attribute(Attribute::Dim),
            energy_cell(summary.losses).add_attribute(Attribute::Dim),
            energy_cell(summary.grid_import).fg(if summary.grid_import > WattHours::ZERO {
                Color::Red
            } else {
                Color::Green
            }),
            energy_cell(summary.unserved).fg(if summary.unserved > WattHours::ZERO {
                Color::Red
            } else {
                Color::Reset
            }),
            energy_cell(summary.curtailed).add_attribute(Attribute::Dim),
            Cell::new(summary.peak_pv_power).set_alignment(CellAlignment::Right),
            summary.average_daily_pv_production().map_or_else(|| Cell::new("-"), energy_cell),
            Cell::new(format!("{:.1}", summary.battery_cycles)).set_alignment(CellAlignment::Right),
            ratio_cell(summary.self_sufficiency()),
            ratio_cell(summary.self_consumption()),
        ]);
    }
    table
}

/// Average PV power per local hour, a column per month.
pub fn build_hourly_profile_table(profiles: &[(Period, [Option<Watts>; 24])]) -> Table {
    let mut table = new_table();
    table.set_header(
        std::iter::once(Cell::new("Hour"))
            .chain(profiles.iter().map(|(period, _)| Cell::new(period))),
    );
    for hour in 0..24 {
        table.add_row(
            std::iter::once(Cell::new(format!("{hour:02}:00")).add_attribute(Attribute::Dim)).chain(
                profiles.iter().map(|(_, profile)| {
                    profile[hour].map_or_else(
                        || Cell::new("-"),
                        |power| {
                            Cell::new(power).set_alignment(CellAlignment::Right).fg(
                                if power > Watts::ZERO { Color::Yellow } else { Color::Reset },
                            )
                        },
                    )
                }),
            ),
        );
    }
    table
}

pub fn build_weather_table(rows: &[(Period, WeatherSummary)]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Month", "GHI, kWh/m²", "Mean", "Min", "Max", "Samples"]);
    for (period, summary) in rows {
        table.add_row(vec![
            Cell::new(period),
            Cell::new(format!("{:.1}", summary.irradiation))
                .set_alignment(CellAlignment::Right)
                .fg(Color::Yellow),
            Cell::new(summary.mean_temperature).set_alignment(CellAlignment::Right),
            Cell::new(summary.min_temperature)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(summary.max_temperature)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(summary.n_samples).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_tower_table(tower: &TowerGeometry) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Parameter", "Value"]);
    for (parameter, value) in [
        ("Diameter", tower.diameter.to_string()),
        ("Height", tower.height.to_string()),
        ("Panel", format!("{} × {}", tower.panel_width, tower.panel_height)),
        ("Power density", tower.power_density.to_string()),
        ("Columns", tower.n_columns().to_string()),
        ("Rows", tower.n_rows().to_string()),
        ("Panels", tower.n_panels().to_string()),
        ("Panel area", tower.panel_area().to_string()),
        ("DC capacity", tower.dc_capacity().to_string()),
    ] {
        table.add_row(vec![
            Cell::new(parameter).add_attribute(Attribute::Dim),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tower_table_ok() {
        let table = build_tower_table(&TowerGeometry::default()).to_string();
        assert!(table.contains("3990 W"), "{table}");
        assert!(table.contains("19"), "{table}");
    }

    #[test]
    fn summary_table_ok() {
        let summary = Summary {
            pv_production: WattHours(12_345.0),
            load: WattHours(10_000.0),
            ..Summary::default()
        };
        let table = build_summary_table(
            [(Period::Month { year: 2024, month: 6 }, summary)],
            Some(&summary),
        )
        .to_string();
        assert!(table.contains("2024-06"), "{table}");
        assert!(table.contains("Total"), "{table}");
        assert!(table.contains("12.3"), "{table}");
    }
}
