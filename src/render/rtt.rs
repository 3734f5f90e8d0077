//! Ping RTT chart: host rows, congestion-control columns, per-second mean
//! line with a min/max band.

use crate::Result;
use crate::config::TestbedConfig;
use crate::render::{color_map, pad_range, per_second_stats};
use crate::table::{Payload, RunTable};
use plotters::prelude::*;
use std::collections::BTreeSet;

const PANEL_WIDTH: u32 = 420;
const PANEL_HEIGHT: u32 = 220;

pub fn render(table: &RunTable, cfg: &TestbedConfig) -> Result<String> {
    let hosts: BTreeSet<String> = table.samples.iter().map(|s| s.host.clone()).collect();
    let congs: BTreeSet<String> = table
        .samples
        .iter()
        .map(|s| s.congestion_control.clone())
        .collect();
    let colors = color_map(hosts.iter().cloned());

    let rows = hosts.len().max(1);
    let cols = congs.len().max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(
            &mut svg,
            (cols as u32 * PANEL_WIDTH, rows as u32 * PANEL_HEIGHT),
        )
        .into_drawing_area();
        root.fill(&WHITE)?;
        let panels = root.split_evenly((rows, cols));

        for (i, host) in hosts.iter().enumerate() {
            for (j, cong) in congs.iter().enumerate() {
                let panel = &panels[i * cols + j];

                let binned = per_second_stats(table.samples.iter().filter_map(|s| {
                    match &s.payload {
                        Payload::Rtt { rtt_ms, .. }
                            if &s.host == host && &s.congestion_control == cong =>
                        {
                            Some((s.relative_time, *rtt_ms))
                        }
                        _ => None,
                    }
                }));
                if binned.is_empty() {
                    continue;
                }

                let x_max = binned.iter().map(|p| p.0).fold(0.0, f64::max);
                let y_max = binned.iter().map(|p| p.3).fold(0.0, f64::max);
                let color = colors[host];

                let mut chart = ChartBuilder::on(panel)
                    .caption(
                        format!("{} \u{2014} {}", cfg.cong_display(cong), host),
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
                    .y_desc("RTT (ms)")
                    .label_style(("sans-serif", 11))
                    .draw()?;

                let band: Vec<(f64, f64)> = binned
                    .iter()
                    .map(|(t, _, min, _)| (*t, *min))
                    .chain(binned.iter().rev().map(|(t, _, _, max)| (*t, *max)))
                    .collect();
                chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.3))))?;
                chart.draw_series(LineSeries::new(
                    binned.iter().map(|(t, mean, _, _)| (*t, *mean)),
                    &color,
                ))?;
            }
        }
        root.present()?;
    }

    Ok(svg)
}
