//! Console summary of a completed run.

use std::path::Path;

use contracts::{AnalysisOutcome, RunReport, TaskReport};
use reporter::format::{optional, significant, SIGNIFICANT_DIGITS};

/// Print the run summary to stdout
pub fn print_summary(report: &RunReport, output_dir: Option<&Path>) {
    let stats = &report.stats;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Telemetry Analysis                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Duration: {:.2}s", stats.duration.as_secs_f64());
    println!("   ├─ Log files: {}", stats.sources);
    println!("   ├─ Messages read: {}", stats.messages_read);
    println!("   ├─ Messages analyzed: {}", stats.messages_matched);
    println!("   ├─ Throughput: {:.0} msg/s", stats.messages_per_sec());
    println!(
        "   └─ Samples: {} accepted, {} rejected ({:.2}%)",
        stats.samples_accepted,
        stats.samples_rejected,
        stats.rejection_rate()
    );

    for task in &report.tasks {
        print_task(task);
    }

    if let Some(dir) = output_dir {
        println!("\n📁 Results written to {}", dir.display());
    }
    println!();
}

fn print_task(task: &TaskReport) {
    let result = &task.result;
    println!("\n📈 {} ({} on {})", result.task_id, result.analysis_type, result.topic_name);
    println!(
        "   ├─ Messages: {}, samples: {}",
        result.message_count, result.sample_count
    );

    match &result.outcome {
        AnalysisOutcome::Passthrough { rows } => {
            println!("   ├─ Rows: {}", rows.len());
        }
        AnalysisOutcome::BasicStats { stats } => {
            println!(
                "   ├─ Mean: {}, std: {}",
                optional(stats.mean),
                optional(stats.std_dev)
            );
            println!(
                "   ├─ Min: {}, max: {}",
                optional(stats.min),
                optional(stats.max)
            );
        }
        AnalysisOutcome::Timestamp(ts) => {
            println!(
                "   ├─ Frequency: {} Hz observed, {} Hz specified",
                optional(ts.observed_frequency_hz),
                significant(ts.specified_frequency_hz, SIGNIFICANT_DIGITS)
            );
            println!(
                "   ├─ Period: {} s mean, jitter {} s",
                optional(ts.period_s.mean),
                optional(ts.jitter_s)
            );
            println!("   ├─ Anomalies: {}", ts.anomaly_count);
        }
    }

    if result.error_counts.is_empty() {
        println!("   └─ Errors: 0");
    } else {
        let parts: Vec<String> = result
            .error_counts
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        println!("   └─ Errors: {}", parts.join(", "));
    }
}
