//! Congestion-window chart: host-group rows, congestion-control columns, one
//! line per flow colored by its source-destination pair.

use crate::Result;
use crate::config::TestbedConfig;
use crate::render::{color_map, pad_range};
use crate::table::{Payload, RunTable, SocketSample};
use plotters::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const PANEL_WIDTH: u32 = 420;
const PANEL_HEIGHT: u32 = 240;

fn sockets(table: &RunTable) -> impl Iterator<Item = (&crate::table::Sample, &SocketSample)> {
    table.samples.iter().filter_map(|s| match &s.payload {
        Payload::Socket(sock) => Some((s, sock)),
        _ => None,
    })
}

pub fn render(table: &RunTable, cfg: &TestbedConfig) -> Result<String> {
    let groups: BTreeSet<String> = sockets(table)
        .filter_map(|(_, sock)| sock.host_group.clone())
        .collect();
    let congs: BTreeSet<String> = sockets(table)
        .map(|(s, _)| s.congestion_control.clone())
        .collect();
    let colors = color_map(sockets(table).map(|(_, sock)| sock.src_dest()));

    let rows = groups.len().max(1);
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

        for (i, group) in groups.iter().enumerate() {
            for (j, cong) in congs.iter().enumerate() {
                let panel = &panels[i * cols + j];

                // flow id -> (pair label, cwnd trace over relative time)
                let mut flows: BTreeMap<String, (String, Vec<(f64, f64)>)> = BTreeMap::new();
                for (s, sock) in sockets(table) {
                    if sock.host_group.as_deref() != Some(group)
                        || &s.congestion_control != cong
                    {
                        continue;
                    }
                    let Some(flow) = &sock.flow_id else {
                        continue;
                    };
                    flows
                        .entry(flow.to_string())
                        .or_insert_with(|| (sock.src_dest(), Vec::new()))
                        .1
                        .push((s.relative_time, sock.cwnd));
                }
                if flows.is_empty() {
                    continue;
                }

                let x_max = flows
                    .values()
                    .flat_map(|(_, pts)| pts.iter().map(|p| p.0))
                    .fold(0.0, f64::max);
                let y_max = flows
                    .values()
                    .flat_map(|(_, pts)| pts.iter().map(|p| p.1))
                    .fold(0.0, f64::max);

                let mut chart = ChartBuilder::on(panel)
                    .caption(
                        format!("{} \u{2014} {}", cfg.cong_display(cong), group),
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
                    .y_desc("cwnd")
                    .label_style(("sans-serif", 11))
                    .draw()?;

                let mut seen_pairs = BTreeSet::new();
                for (_, (pair, points)) in &flows {
                    let color = colors[pair];
                    let series = chart.draw_series(LineSeries::new(
                        points.iter().copied(),
                        color.mix(0.6).stroke_width(1),
                    ))?;
                    // One legend entry per pair, not per flow.
                    if i == 0 && j == 0 && seen_pairs.insert(pair.clone()) {
                        series.label(pair).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 16, y)], color)
                        });
                    }
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
