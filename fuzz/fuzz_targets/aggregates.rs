#![no_main]

use libfuzzer_sys::fuzz_target;
use wrapped::stats;
use wrapped::{Dataset, SongPlay};

fuzz_target!(|data: &[u8]| {
    let dataset: Dataset = data
        .chunks(4)
        .enumerate()
        .map(|(row, chunk)| {
            let plays = chunk
                .iter()
                .fold(0_u64, |acc, byte| acc.wrapping_mul(251).wrapping_add(u64::from(*byte)));
            SongPlay::new(
                &format!("song_{row}"),
                &format!("artist_{}", chunk[0] % 5),
                &format!("genre_{}", chunk[0] % 3),
                plays,
            )
        })
        .collect();
    let bins = data.first().map(|byte| usize::from(*byte % 40)).unwrap_or(20);

    let histogram = stats::play_count_histogram(&dataset, bins);
    assert_eq!(
        histogram.iter().map(|bucket| bucket.count).sum::<u64>(),
        dataset.len() as u64
    );
    assert_eq!(
        stats::genre_totals(&dataset)
            .iter()
            .map(|genre| genre.play_count)
            .sum::<u64>(),
        stats::total_plays(&dataset)
    );
    assert_eq!(stats::compute_summary(&dataset).is_err(), dataset.is_empty());
});
