use std::path::Path;

use ansi_term::Style;
use anyhow::Result;

use crate::daemon::{
    stats::{
        aggregator::StatsAggregator,
        entities::KeyCount,
        store::{JsonStatsStore, StatsStore},
    },
    STORE_FILE,
};

/// Reads the stats document the daemon last persisted. Saves are atomic
/// renames, so reading while the daemon runs is safe; the view just trails
/// the live counters by up to the debounce window.
async fn load_aggregator(dir: &Path) -> Result<StatsAggregator> {
    let store = JsonStatsStore::new(dir.join(STORE_FILE))?;
    let (aggregator, _) = StatsAggregator::from_document(store.load().await?);
    Ok(aggregator)
}

pub async fn print_today(dir: &Path) -> Result<()> {
    let aggregator = load_aggregator(dir).await?;
    let today = aggregator.today();

    println!(
        "{}",
        Style::new().bold().paint(format!("Stats for {}", today.date))
    );
    println!("Keystrokes      {:>10}", format_count(today.key_strokes));
    println!("Left clicks     {:>10}", format_count(today.left_clicks));
    println!("Right clicks    {:>10}", format_count(today.right_clicks));
    println!("Mouse distance  {:>10.0} px", today.mouse_distance);
    println!("Scroll distance {:>10.0} px", today.scroll_distance);
    Ok(())
}

pub async fn print_history(dir: &Path, days: usize) -> Result<()> {
    let aggregator = load_aggregator(dir).await?;

    println!(
        "{}",
        Style::new()
            .bold()
            .paint("Date\t\tKeys\tClicks\tMouse\tScroll")
    );
    for day in aggregator.history_data(days) {
        println!(
            "{}\t{}\t{}\t{:.0} px\t{:.0} px",
            day.date,
            format_count(day.key_strokes),
            format_count(day.clicks),
            day.mouse_distance,
            day.scroll_distance,
        );
    }
    Ok(())
}

pub async fn print_keys(dir: &Path, total: bool) -> Result<()> {
    let aggregator = load_aggregator(dir).await?;

    let (title, ranked) = if total {
        ("Most pressed keys (all time)", aggregator.total_key_stats())
    } else {
        ("Most pressed keys (today)", aggregator.key_stats())
    };

    println!("{}", Style::new().bold().paint(title));
    if ranked.is_empty() {
        println!("No keys recorded yet");
        return Ok(());
    }
    for (position, KeyCount { key, count }) in ranked.into_iter().enumerate() {
        println!("{:>2}. {:>8}  {key}", position + 1, format_count(count));
    }
    Ok(())
}

fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 10_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::format_count;

    #[test]
    fn small_counts_print_exactly() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(9_999), "9999");
    }

    #[test]
    fn large_counts_abbreviate() {
        assert_eq!(format_count(12_345), "12.3K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }
}
