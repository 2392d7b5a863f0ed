use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use storyscroll_core::layout::compute_extent;
use storyscroll_core::mapper::StepIndexMapper;
use storyscroll_core::region::ScrollRegion;
use storyscroll_core::{AppConfig, Measurements, Story};

#[derive(Debug, Serialize)]
struct LayoutReport {
    title: Option<String>,
    viewport: u32,
    pinned: u32,
    extent: f64,
    steps: Vec<StepWindow>,
}

/// Where one step is current, in progress and in rows
#[derive(Debug, Serialize)]
struct StepWindow {
    index: usize,
    title: String,
    asset: String,
    start_progress: f64,
    end_progress: f64,
    start_offset: f64,
    end_offset: f64,
}

pub fn run(config: &AppConfig, story_path: &Path, viewport: u32, pinned: u32, json: bool) -> Result<()> {
    let story = Story::load(story_path)
        .with_context(|| format!("Failed to load story {}", story_path.display()))?;
    let report = build_report(&story, config, viewport, pinned)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let title = report.title.as_deref().unwrap_or("(untitled)");
    println!("{} ({} steps)\n", title, report.steps.len());
    println!(
        "  viewport {} rows, pinned {} rows, extent {} rows\n",
        report.viewport, report.pinned, report.extent
    );

    for window in &report.steps {
        println!("  {}. {}", window.index + 1, window.title);
        println!(
            "    progress {:.3} - {:.3}  rows {:.0} - {:.0}",
            window.start_progress, window.end_progress, window.start_offset, window.end_offset
        );
        println!("    asset: {}", window.asset);
    }

    Ok(())
}

fn build_report(story: &Story, config: &AppConfig, viewport: u32, pinned: u32) -> Result<LayoutReport> {
    if viewport == 0 {
        bail!("viewport must be at least one row");
    }

    let measurements = Measurements::new(0.0, pinned.min(viewport) as f64, viewport as f64);
    let extent = compute_extent(story.len(), &measurements, config.layout.min_extent_ratio);
    let region = ScrollRegion::new(measurements.pin_start, extent);
    let mapper = StepIndexMapper::new(story.len());

    let steps = story
        .iter()
        .map(|step| {
            let start_progress = mapper.step_start(step.index());
            let end_progress = if step.index() + 1 < story.len() {
                mapper.step_start(step.index() + 1)
            } else {
                1.0
            };
            StepWindow {
                index: step.index(),
                title: step.title().to_string(),
                asset: step.asset().to_string(),
                start_progress,
                end_progress,
                start_offset: region.offset_for_progress(start_progress),
                end_offset: region.offset_for_progress(end_progress),
            }
        })
        .collect();

    Ok(LayoutReport {
        title: story.title().map(str::to_string),
        viewport,
        pinned,
        extent,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyscroll_core::StepSpec;

    fn story(count: usize) -> Story {
        let specs = (1..=count)
            .map(|i| StepSpec {
                title: format!("Step {i}"),
                asset: Some(format!("{i}.png")),
                ..Default::default()
            })
            .collect();
        Story::new(specs).unwrap()
    }

    #[test]
    fn test_report_windows() {
        let report = build_report(&story(4), &AppConfig::default(), 40, 12).unwrap();
        // 3 * 40 - 12
        assert_eq!(report.extent, 108.0);
        assert_eq!(report.steps.len(), 4);

        let second = &report.steps[1];
        assert_eq!(second.start_progress, 0.25);
        assert_eq!(second.end_progress, 0.5);
        assert_eq!(second.start_offset, 27.0);
        assert_eq!(second.end_offset, 54.0);

        let last = &report.steps[3];
        assert_eq!(last.end_progress, 1.0);
        assert_eq!(last.end_offset, 108.0);
    }

    #[test]
    fn test_single_step_uses_floor() {
        let report = build_report(&story(1), &AppConfig::default(), 40, 12).unwrap();
        // round(40 * 0.35)
        assert_eq!(report.extent, 14.0);
        assert_eq!(report.steps[0].start_offset, 0.0);
    }

    #[test]
    fn test_zero_viewport_rejected() {
        assert!(build_report(&story(2), &AppConfig::default(), 0, 12).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let report = build_report(&story(2), &AppConfig::default(), 40, 12).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"][1]["title"], "Step 2");
        assert_eq!(json["extent"], 28.0);
    }
}
