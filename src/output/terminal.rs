//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::{BenchReport, LatencyRow, PingPongReport, SortReport, SyncReport};

fn separator() -> String {
    "\u{2500}".repeat(78)
}

/// Format a full run for human-readable terminal output.
pub fn format_report(report: &BenchReport) -> String {
    let mut output = String::new();
    let sep = separator();

    output.push_str(&format!("{}\n", "cafbench".bold()));
    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!("  Images:           {}\n", report.num_images));
    output.push_str(&format!("  Timer resolution: {} ns\n", report.timer_resolution_ns));
    output.push('\n');

    for pingpong in &report.pingpong {
        output.push_str(&format_pingpong(pingpong));
        output.push('\n');
    }

    if !report.sync.is_empty() {
        output.push_str(&format_sync(&report.sync));
        output.push('\n');
    }

    for sort in &report.sort {
        output.push_str(&format_sort(sort));
        output.push('\n');
    }

    if !report.get_latency.is_empty() {
        let title = format!("get latency (image 0 from image {})", report.num_images.saturating_sub(1));
        output.push_str(&format_latency(&title, &report.get_latency));
        output.push('\n');
    }
    if !report.alloc_latency.is_empty() {
        output.push_str(&format_latency("allocation latency", &report.alloc_latency));
        output.push('\n');
    }

    output.push_str(&sep);
    output.push('\n');
    output
}

/// Format one ping-pong size sweep as a table.
pub fn format_pingpong(report: &PingPongReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} {} ({} ping-pong, {}, images {} and {})\n",
        "\u{25B8}".cyan(),
        report.mode.name().bold(),
        report.pairing.name(),
        report.sync.name(),
        report.image1,
        report.image2
    ));
    output.push_str(&format!(
        "  {:>8} {:>8} {:>8} {:>9} {:>9} {:>9} {:>12} {:>12} {:>12} {:>4}\n",
        "count", "blksize", "stride", "ndata", "nextent", "nrep", "time (us)", "lat (us)", "bw (MiB/s)", "out"
    ));

    for row in &report.rows {
        let outliers = if row.outliers > 0 {
            row.outliers.to_string().yellow().to_string()
        } else {
            row.outliers.to_string()
        };
        output.push_str(&format!(
            "  {:>8} {:>8} {:>8} {:>9} {:>9} {:>9} {:>12.3} {:>12.3} {:>12.2} {:>4}\n",
            row.count,
            row.blksize,
            row.stride,
            row.ndata,
            row.nextent,
            row.nrep,
            row.time_us,
            row.latency_us,
            row.bandwidth_mib_s,
            outliers
        ));
    }

    if report.checked {
        let status = if report.verified {
            "\u{2713} Data verified".green().bold()
        } else {
            "\u{2717} Verification failed, sweep stopped".red().bold()
        };
        output.push_str(&format!("  {}\n", status));
    }

    output
}

/// Format all synchronisation patterns as one table.
pub fn format_sync(reports: &[SyncReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", "\u{25B8}".cyan(), "synchronisation".bold()));
    output.push_str(&format!(
        "  {:<20} {:>6} {:>14} {:>12} {:>14} {:>12} {:>4}\n",
        "pattern", "neigh", "time (us)", "+/- (us)", "per sync (us)", "+/- (us)", "out"
    ));

    for report in reports {
        let time = format!("{:>14.3}", report.sync_time_us);
        // Negative means the primitive was lost in the noise of the reference loop.
        let time = if report.sync_time_us < 0.0 {
            time.yellow().to_string()
        } else {
            time
        };
        output.push_str(&format!(
            "  {:<20} {:>6} {} {:>12.3} {:>14.4} {:>12.4} {:>4}\n",
            report.kind.name(),
            report.neighbours,
            time,
            report.error_us,
            report.per_sync_us,
            report.per_sync_error_us,
            report.reference.outliers + report.real.outliers
        ));
    }

    output
}

/// Format one sort backend's timings.
pub fn format_sort(report: &SortReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} {} sort ({} keys, {:.1} MiB, {}, {} threads)\n",
        "\u{25B8}".cyan(),
        report.backend.name().bold(),
        report.elements,
        report.megabytes,
        report.distribution.name(),
        report.threads
    ));

    for (iteration, time) in report.times.iter().enumerate().skip(1) {
        output.push_str(&format!("  {:>3} {:>14.6} s\n", iteration, time.as_secs_f64()));
    }
    output.push_str(&format!(
        "  mean {:.6} s, std dev {:.3} ms, {} outliers\n",
        report.stats.mean.as_secs_f64(),
        report.stats.std_dev_us / 1e3,
        report.stats.outliers
    ));

    output
}

/// Format a fixed-iteration latency sweep as a table.
pub fn format_latency(title: &str, rows: &[LatencyRow]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", "\u{25B8}".cyan(), title.bold()));
    output.push_str(&format!("  {:>10} {:>10} {:>8} {:>14}\n", "elements", "bytes", "iters", "latency (us)"));
    for row in rows {
        output.push_str(&format!(
            "  {:>10} {:>10} {:>8} {:>14.3}\n",
            row.elements, row.bytes, row.iterations, row.latency_us
        ));
    }

    output
}
