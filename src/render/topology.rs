//! Static diagram of the star testbed topology.
//!
//! The topology is not recovered from logs; it is the fixed description of
//! the virtual networks the experiments run on. Each network bridges the
//! router and exactly one guest, which yields the star around router1.

use crate::Result;
use plotters::prelude::*;

/// One virtual network and the devices attached to its bridge.
struct Network {
    name: &'static str,
    bridge: &'static str,
    devices: [&'static str; 2],
}

const STAR: [Network; 4] = [
    Network {
        name: "net1",
        bridge: "virbr1",
        devices: ["router1", "vm1"],
    },
    Network {
        name: "net2",
        bridge: "virbr2",
        devices: ["router1", "vm2"],
    },
    Network {
        name: "net3",
        bridge: "virbr3",
        devices: ["router1", "vm3"],
    },
    Network {
        name: "net4",
        bridge: "virbr4",
        devices: ["router1", "vm4"],
    },
];

/// Node positions: router in the center, guests on a circle around it.
fn positions() -> Vec<(&'static str, (f64, f64))> {
    let mut spokes: Vec<&'static str> = STAR
        .iter()
        .flat_map(|n| n.devices)
        .filter(|d| *d != "router1")
        .collect();
    spokes.sort();
    spokes.dedup();

    let mut out = vec![("router1", (0.0, 0.0))];
    let n = spokes.len().max(1) as f64;
    for (i, device) in spokes.into_iter().enumerate() {
        let angle = std::f64::consts::TAU * i as f64 / n + std::f64::consts::FRAC_PI_4;
        out.push((device, (angle.cos(), angle.sin())));
    }
    out
}

pub fn render() -> Result<String> {
    let positions = positions();
    let pos = |name: &str| {
        positions
            .iter()
            .find(|(d, _)| *d == name)
            .map(|(_, p)| *p)
            .unwrap_or((0.0, 0.0))
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (640, 640)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Testbed topology", ("sans-serif", 18))
            .margin(20)
            .build_cartesian_2d(-1.5f64..1.5f64, -1.5f64..1.5f64)?;

        // Edges first so the node markers overdraw them.
        for net in &STAR {
            let [a, b] = net.devices;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![pos(a), pos(b)],
                BLACK.mix(0.5).stroke_width(2),
            )))?;

            // Network label at the edge midpoint.
            let (ax, ay) = pos(a);
            let (bx, by) = pos(b);
            chart.draw_series(std::iter::once(Text::new(
                format!("{} ({})", net.name, net.bridge),
                ((ax + bx) / 2.0, (ay + by) / 2.0 + 0.08),
                ("sans-serif", 12).into_font().color(&BLACK.mix(0.7)),
            )))?;
        }

        for (device, (x, y)) in &positions {
            let style = if *device == "router1" {
                RGBColor(0xc9, 0x7b, 0x2d).filled()
            } else {
                RGBColor(0x1f, 0x4e, 0x79).filled()
            };
            chart.draw_series(std::iter::once(Circle::new((*x, *y), 14, style)))?;
            chart.draw_series(std::iter::once(Text::new(
                device.to_string(),
                (*x, *y - 0.18),
                ("sans-serif", 14),
            )))?;
        }

        root.present()?;
    }

    Ok(svg)
}
