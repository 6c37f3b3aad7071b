//! Console output for experiment results.

use iot_lab_abstract::DeviceClass;
use iot_lab_simulator::ExperimentOutcome;
use iot_lab_simulator::experiment::{DelayComparison, MobileComparison};
use iot_lab_simulator::stats::Summary;
use iot_lab_simulator::trace::{BufferReport, PipelineReport, ResultSeries, SweepPoint};

pub fn print_outcome(title: &str, outcome: &ExperimentOutcome, with_series: bool) {
    println!("\n=== {title} ===");
    match outcome {
        ExperimentOutcome::Delay(report) => {
            println!("Mean latency: {:.2} ms", report.latency.mean);
            if with_series {
                print_series(&report.latency);
            }
        }
        ExperimentOutcome::DelayComparison(comparison) => print_delay(comparison, with_series),
        ExperimentOutcome::Buffer(report) => print_buffer(report, with_series),
        ExperimentOutcome::BufferSweep { runs } => {
            for report in runs {
                print_buffer(report, with_series);
            }
        }
        ExperimentOutcome::Pipeline(report) => print_pipeline("Run", report, with_series),
        ExperimentOutcome::Sweep { points } => print_sweep(points),
        ExperimentOutcome::MobileComparison(comparison) => print_mobile(comparison, with_series),
    }
}

fn print_delay(comparison: &DelayComparison, with_series: bool) {
    println!("Baseline mean latency:  {:.2} ms", comparison.baseline.latency.mean);
    println!("Optimized mean latency: {:.2} ms", comparison.optimized.latency.mean);
    println!("Latency reduction:      {:.2}%", comparison.reduction_percent);
    if with_series {
        print_series(&comparison.baseline.latency);
        print_series(&comparison.optimized.latency);
    }
}

fn print_buffer(report: &BufferReport, with_series: bool) {
    println!(
        "Drain every {} ms: peak {} message(s), mean {:.2}, {} drain(s)",
        report.drain_interval, report.peak, report.occupancy.mean, report.drains
    );
    if with_series {
        print_series(&report.occupancy);
    }
}

fn print_pipeline(title: &str, report: &PipelineReport, with_series: bool) {
    println!(
        "{title}: mean latency {:.2} ms, mean queue delay {:.2} ms, {} overflow(s)",
        report.latency.mean, report.mean_queue_delay, report.overflow_count
    );
    for class in [DeviceClass::Mobile, DeviceClass::Stationary] {
        println!("  {}", format_class(class, report.by_class.get(class)));
    }
    if with_series {
        for task in &report.tasks {
            println!("  {:>5}  {:<10}  {:>8.2}", task.seq, task.class, task.latency_ms);
        }
    }
}

fn print_mobile(comparison: &MobileComparison, with_series: bool) {
    print_pipeline("Before optimization", &comparison.baseline, with_series);
    print_pipeline("After optimization (mobile)", &comparison.optimized, with_series);
    println!("Latency reduction: {:.2}%", comparison.reduction_percent);
}

fn print_sweep(points: &[SweepPoint]) {
    for point in points {
        println!(
            "{:<12} mean latency {:>8.2} ms | queue delay {:>7.2} ms | overflows {}",
            point.label, point.mean_latency, point.mean_queue_delay, point.overflow_count
        );
    }
}

fn print_series(series: &ResultSeries) {
    println!("  {} (mean {:.2})", series.label, series.mean);
    for (task, value) in series.points() {
        println!("  {task:>5}  {value:>8.2}");
    }
}

fn format_class(class: DeviceClass, summary: Option<&Summary>) -> String {
    match summary {
        Some(s) => format!(
            "{class:<10} n={:<4} mean {:>7.2}  min {:>7.2}  median {:>7.2}  max {:>7.2}",
            s.count, s.mean, s.min, s.median, s.max
        ),
        None => format!("{class:<10} no tasks"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_line_formats_summary_or_absence() {
        let summary = Summary::of(&[100.0, 200.0]).unwrap();
        let line = format_class(DeviceClass::Mobile, Some(&summary));
        assert!(line.starts_with("Mobile"));
        assert!(line.contains("n=2"));
        assert!(line.contains("mean  150.00"));

        assert_eq!(
            format_class(DeviceClass::Stationary, None),
            "Stationary no tasks"
        );
    }
}
