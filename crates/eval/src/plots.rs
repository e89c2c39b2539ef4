use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

use crate::pairwise::PairScores;
use crate::scoring::Category;

const COLORS: [RGBColor; 3] = [RED, BLUE, GREEN];

pub fn generate_plots(runs: &[PairScores], output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    if runs.is_empty() {
        tracing::warn!("No runs to plot");
        return Ok(());
    }

    // Plot 1: micro F1 per category
    let bars: Vec<(String, [f64; 3])> = runs
        .iter()
        .map(|run| {
            let totals = &run.scores.totals;
            (run.label(), Category::ALL.map(|c| totals.get(c).f1()))
        })
        .collect();
    plot_grouped_bars(
        &bars,
        "F1 by Category",
        &output_dir.join("f1_by_category.png"),
    )?;

    // Plot 2: macro F1, when every run has it
    let macro_bars: Option<Vec<(String, [f64; 3])>> = runs
        .iter()
        .map(|run| {
            run.scores
                .macro_f1
                .map(|m| (run.label(), Category::ALL.map(|c| m.get(c).map_or(0.0, |s| s.mean))))
        })
        .collect();
    if let Some(macro_bars) = macro_bars {
        plot_grouped_bars(
            &macro_bars,
            "Macro F1 by Category (mean over documents)",
            &output_dir.join("macro_f1.png"),
        )?;
    }

    Ok(())
}

fn plot_grouped_bars(bars: &[(String, [f64; 3])], caption: &str, path: &Path) -> Result<()> {
    let width = (200 + 120 * bars.len() as u32).max(800);
    let root = BitMapBackend::new(path, (width, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..bars.len() as f64, 0f64..1.1f64)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("F1")
        .x_labels(bars.len())
        .x_label_formatter(&|x| {
            let index = x.floor() as usize;
            labels.get(index).cloned().unwrap_or_default()
        })
        .draw()?;

    for (slot, category) in Category::ALL.iter().enumerate() {
        let color = COLORS[slot];
        let left = 0.1 + slot as f64 * 0.27;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, values))| {
                let x = i as f64 + left;
                Rectangle::new([(x, 0.0), (x + 0.25, values[slot])], color.filled())
            }))?
            .label(category.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    tracing::info!(path = ?path, "Saved plot");
    Ok(())
}
