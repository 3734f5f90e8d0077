//! Throughput comparison chart: congestion-control rows, sender/receiver
//! columns, one mean line plus min/max band per host.

use crate::Result;
use crate::config::TestbedConfig;
use crate::render::{color_map, pad_range, per_second_stats};
use crate::table::{Payload, RunTable};
use plotters::prelude::*;
use std::collections::BTreeSet;

const PANEL_WIDTH: u32 = 420;
const PANEL_HEIGHT: u32 = 240;

pub fn render(table: &RunTable, cfg: &TestbedConfig) -> Result<String> {
    let congs: BTreeSet<String> = table
        .samples
        .iter()
        .map(|s| s.congestion_control.clone())
        .collect();
    let directions: Vec<bool> = [true, false]
        .into_iter()
        .filter(|dir| {
            table.samples.iter().any(
                |s| matches!(s.payload, Payload::Throughput { sender, .. } if sender == *dir),
            )
        })
        .collect();
    let colors = color_map(table.samples.iter().map(|s| s.host.clone()));

    let rows = congs.len().max(1);
    let cols = directions.len().max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(
            &mut svg,
            (cols as u32 * PANEL_WIDTH, rows as u32 * PANEL_HEIGHT),
        )
        .into_drawing_area();
        root.fill(&WHITE)?;
        let panels = root.split_evenly((rows, cols));

        for (i, cong) in congs.iter().enumerate() {
            for (j, dir) in directions.iter().enumerate() {
                let panel = &panels[i * cols + j];

                // Per host: one-second mean/min/max of Mbit/s.
                let mut series = Vec::new();
                for (host, color) in &colors {
                    let binned = per_second_stats(table.samples.iter().filter_map(|s| {
                        match &s.payload {
                            Payload::Throughput {
                                bits_per_second,
                                sender,
                            } if sender == dir
                                && &s.congestion_control == cong
                                && &s.host == host =>
                            {
                                Some((s.relative_time, bits_per_second / 1e6))
                            }
                            _ => None,
                        }
                    }));
                    if !binned.is_empty() {
                        series.push((host.clone(), *color, binned));
                    }
                }
                if series.is_empty() {
                    continue;
                }

                let x_max = series
                    .iter()
                    .flat_map(|(_, _, b)| b.iter().map(|p| p.0))
                    .fold(0.0, f64::max);
                let y_max = series
                    .iter()
                    .flat_map(|(_, _, b)| b.iter().map(|p| p.3))
                    .fold(0.0, f64::max);

                let direction = if *dir { "Sender" } else { "Receiver" };
                let mut chart = ChartBuilder::on(panel)
                    .caption(
                        format!("{} \u{2014} {}", cfg.cong_display(cong), direction),
                        ("sans-serif", 15),
                    )
                    .margin(8)
                    .x_label_area_size(26)
                    .y_label_area_size(44)
                    .build_cartesian_2d(pad_range(0.0, x_max), pad_range(0.0, y_max))?;
                chart
                    .configure_mesh()
                    .x_labels(6)
                    .y_labels(5)
                    .x_desc("Time (s)")
                    .y_desc("Mbit/s")
                    .label_style(("sans-serif", 11))
                    .draw()?;

                for (host, color, binned) in &series {
                    let band: Vec<(f64, f64)> = binned
                        .iter()
                        .map(|(t, _, min, _)| (*t, *min))
                        .chain(binned.iter().rev().map(|(t, _, _, max)| (*t, *max)))
                        .collect();
                    chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.2))))?;

                    let color = *color;
                    chart
                        .draw_series(LineSeries::new(
                            binned.iter().map(|(t, mean, _, _)| (*t, *mean)),
                            &color,
                        ))?
                        .label(format!("{host} mean (1s)"))
                        .legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 16, y)], color)
                        });
                }

                if i == 0 && j == 0 {
                    chart
                        .configure_series_labels()
                        .border_style(BLACK.mix(0.4))
                        .background_style(WHITE.mix(0.85))
                        .label_font(("sans-serif", 11))
                        .draw()?;
                }
            }
        }
        root.present()?;
    }

    Ok(svg)
}
