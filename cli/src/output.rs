use engine::core::format::{
    format_flag, format_fraction, format_ms, format_multiplier, format_percent, format_signed_ms,
};
use engine::tasks::nback::NBackMetrics;
use engine::tasks::sorting::SortingMetrics;
use engine::tasks::stroop::StroopMetrics;
use engine::SummaryRecord;

/// Plain-text report for one finished run.
pub fn print_record(record: &SummaryRecord) {
    println!();
    println!("{} ({})", title(&record.task), record.id);
    match record.task.as_str() {
        "nback" => {
            if let Some(metrics) = record.metrics_as::<NBackMetrics>() {
                print_nback(&metrics);
            }
        }
        "stroop" => {
            if let Some(metrics) = record.metrics_as::<StroopMetrics>() {
                print_stroop(&metrics);
            }
        }
        "sorting" => {
            if let Some(metrics) = record.metrics_as::<SortingMetrics>() {
                print_sorting(&metrics);
            }
        }
        other => println!("  unknown task {other}"),
    }
    println!("  {}", record.qc.summary());
}

fn title(task: &str) -> &'static str {
    match task {
        "nback" => "N-back",
        "stroop" => "Go/No-Go Stroop",
        "sorting" => "Card sorting",
        _ => "Task",
    }
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {label:<26} {value}");
}

fn print_nback(m: &NBackMetrics) {
    row("Trials", m.total_trials);
    row("Hits / misses", format!("{} / {}", m.hits, m.misses));
    row("False alarms", m.false_alarms);
    row("Accuracy", format_fraction(m.accuracy));
    row("d′", format!("{:.2}", m.d_prime));
    row("Criterion", format!("{:.2}", m.criterion));
    row("Mean RT", format_ms(m.mean_rt_ms));
    row("Max N", m.max_n_level);
    row("Working memory score", m.working_memory_score);
    row("Points", m.points);
}

fn print_stroop(m: &StroopMetrics) {
    row("Trials", m.total_trials);
    row("Impulse error rate", format_percent(m.impulse_error_rate));
    row("Omission errors", m.omission_errors);
    row("Average RT", format_ms(m.avg_reaction_time_ms));
    row("Stroop effect", format_signed_ms(m.stroop_effect_ms));
    row("Inhibition score", m.inhibition_score);
    row("Impulse control", format_flag(m.impulse_control_achieved));
    row("Peak speed", format_multiplier(m.peak_speed_multiplier));
    row("Overdrive", format_flag(m.overdrive_reached));
    row("Points", m.points);
}

fn print_sorting(m: &SortingMetrics) {
    row("Trials", m.total_trials);
    row("Categories completed", m.categories_completed);
    row("Perseverative errors", m.perseverative_errors);
    row("Other errors", m.non_perseverative_errors);
    row("Flexibility index", format!("{:.2}", m.flexibility_index));
    row("Adaptive solver", format_flag(m.adaptive_solver_achieved));
    row("Conceptual responses", format_percent(m.conceptual_level_responses));
    row("Points", m.points);
}
