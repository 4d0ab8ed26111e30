use std::time::Instant;

use crate::aggregate::{build_view, Sources};
use crate::config::Config;
use crate::filter::FilterState;
use crate::matcher::SkimMatcher;
use crate::model::{HistoryRecord, TabRecord};

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_view_p95_under_100ms() {
    let open_tabs: Vec<TabRecord> = (0..200)
        .map(|i| TabRecord {
            last_accessed: Some(i),
            ..TabRecord::new(
                i,
                &format!("Issue #{i:04} tracker"),
                &format!("https://tracker{i}.example/issues/{i}"),
            )
        })
        .collect();
    let history: Vec<HistoryRecord> = (0..300)
        .map(|i| HistoryRecord {
            id: i.to_string(),
            url: Some(format!("https://news.example/story/{i}")),
            title: Some(format!("Story {i:05}")),
            ..HistoryRecord::default()
        })
        .collect();
    let sources = Sources {
        open_tabs,
        history,
        ..Sources::default()
    };
    let filter = FilterState::default();
    let cfg = Config::default();
    let matcher = SkimMatcher::default();

    for _ in 0..10 {
        let _ = build_view(&sources, &filter, "trk 042", &matcher, &cfg);
    }

    let mut samples = Vec::with_capacity(40);
    for _ in 0..40 {
        let start = Instant::now();
        let _ = build_view(&sources, &filter, "trk 042", &matcher, &cfg);
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    let p95 = p95_ms(&mut samples);
    assert!(p95 <= 100.0, "view p95 too high: {p95:.3}ms (budget 100.0ms)");
}
