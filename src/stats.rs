use crate::model::{Analysis, Dataset, GroupTotal, HistogramBucket, SongPlay, Summary};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, instrument};

pub const TOP_SONGS_COUNT: usize = 10;
pub const TOP_ARTISTS_COUNT: usize = 5;
pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dataset has no records")]
pub struct EmptyDatasetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub top_songs: usize,
    pub top_artists: usize,
    pub histogram_bins: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_songs: TOP_SONGS_COUNT,
            top_artists: TOP_ARTISTS_COUNT,
            histogram_bins: HISTOGRAM_BINS,
        }
    }
}

pub fn total_plays(dataset: &Dataset) -> u64 {
    dataset
        .iter()
        .fold(0_u64, |total, song| total.saturating_add(song.play_count))
}

pub fn total_songs(dataset: &Dataset) -> usize {
    dataset.len()
}

pub fn top_song(dataset: &Dataset) -> Result<&SongPlay, EmptyDatasetError> {
    // strict comparison keeps the earliest row on ties
    let mut best: Option<&SongPlay> = None;
    for song in dataset.iter() {
        if best.is_none_or(|current| song.play_count > current.play_count) {
            best = Some(song);
        }
    }
    best.ok_or(EmptyDatasetError)
}

pub fn top_artist(dataset: &Dataset) -> Result<String, EmptyDatasetError> {
    first_max(group_totals(dataset, |song| &song.artist))
}

pub fn top_genre(dataset: &Dataset) -> Result<String, EmptyDatasetError> {
    first_max(group_totals(dataset, |song| &song.genre))
}

pub fn top_n_songs(dataset: &Dataset, n: usize) -> Vec<SongPlay> {
    let mut rows: Vec<&SongPlay> = dataset.iter().collect();
    rows.sort_by(|a, b| compare_counts(a.play_count, b.play_count));
    rows.into_iter().take(n).cloned().collect()
}

pub fn top_n_artists_by_total(dataset: &Dataset, n: usize) -> Vec<GroupTotal> {
    let mut totals = group_totals(dataset, |song| &song.artist);
    totals.sort_by(|a, b| compare_counts(a.play_count, b.play_count));
    totals.truncate(n);
    totals
}

pub fn genre_totals(dataset: &Dataset) -> Vec<GroupTotal> {
    let mut totals = group_totals(dataset, |song| &song.genre);
    totals.sort_by(|a, b| compare_counts(a.play_count, b.play_count));
    totals
}

/// Splits `[min, max]` of the play counts into `bins` equal-width buckets.
///
/// Every bucket is half-open except the last, which also holds `max`. When all
/// counts are equal the range is widened by half a play on each side, so the
/// shared value lands in exactly one bucket. An empty dataset yields `bins`
/// zero buckets over `[0, 1]`. A `bins` of zero is treated as one.
pub fn play_count_histogram(dataset: &Dataset, bins: usize) -> Vec<HistogramBucket> {
    let bins = bins.max(1);
    let (lower, upper) = histogram_range(dataset);
    let edges = bucket_edges(lower, upper, bins);

    let mut counts = vec![0_u64; bins];
    for song in dataset.iter() {
        let index = bucket_index(&edges, song.play_count as f64);
        counts[index] = counts[index].saturating_add(1);
    }

    edges
        .windows(2)
        .zip(counts)
        .map(|(edge, count)| HistogramBucket {
            lower: edge[0],
            upper: edge[1],
            count,
        })
        .collect()
}

pub fn compute_summary(dataset: &Dataset) -> Result<Summary, EmptyDatasetError> {
    Ok(Summary {
        total_plays: total_plays(dataset),
        total_songs: total_songs(dataset),
        top_song: top_song(dataset)?.clone(),
        top_artist: top_artist(dataset)?,
        top_genre: top_genre(dataset)?,
    })
}

#[instrument(skip_all, fields(rows = dataset.len()), level = "debug")]
pub fn analyze(dataset: &Dataset, options: &AnalysisOptions) -> Result<Analysis, EmptyDatasetError> {
    let summary = compute_summary(dataset)?;
    let analysis = Analysis {
        summary,
        top_songs: top_n_songs(dataset, options.top_songs),
        top_artists: top_n_artists_by_total(dataset, options.top_artists),
        genres: genre_totals(dataset),
        histogram: play_count_histogram(dataset, options.histogram_bins),
    };
    debug!(
        total_plays = analysis.summary.total_plays,
        genres = analysis.genres.len(),
        "analysis computed"
    );
    Ok(analysis)
}

fn group_totals<'a, F>(dataset: &'a Dataset, key: F) -> Vec<GroupTotal>
where
    F: Fn(&'a SongPlay) -> &'a String,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<GroupTotal> = Vec::new();
    for song in dataset.iter() {
        let name = key(song);
        let index = *positions.entry(name.as_str()).or_insert_with(|| {
            totals.push(GroupTotal {
                name: name.clone(),
                play_count: 0,
            });
            totals.len() - 1
        });
        let entry = &mut totals[index];
        entry.play_count = entry.play_count.saturating_add(song.play_count);
    }
    totals
}

fn first_max(totals: Vec<GroupTotal>) -> Result<String, EmptyDatasetError> {
    let mut best: Option<GroupTotal> = None;
    for total in totals {
        if best
            .as_ref()
            .is_none_or(|current| total.play_count > current.play_count)
        {
            best = Some(total);
        }
    }
    best.map(|total| total.name).ok_or(EmptyDatasetError)
}

fn compare_counts(a: u64, b: u64) -> Ordering {
    b.cmp(&a)
}

fn histogram_range(dataset: &Dataset) -> (f64, f64) {
    let min = dataset.iter().map(|song| song.play_count).min();
    let max = dataset.iter().map(|song| song.play_count).max();
    match (min, max) {
        (Some(min), Some(max)) if min == max => (min as f64 - 0.5, max as f64 + 0.5),
        (Some(min), Some(max)) => (min as f64, max as f64),
        _ => (0.0, 1.0),
    }
}

fn bucket_edges(lower: f64, upper: f64, bins: usize) -> Vec<f64> {
    let width = (upper - lower) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lower + width * i as f64).collect();
    edges.push(upper);
    edges
}

fn bucket_index(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    let lower = edges[0];
    let upper = edges[bins];
    let scaled = (value - lower) / (upper - lower) * bins as f64;
    let mut index = (scaled.max(0.0) as usize).min(bins - 1);

    // float rounding can land one bucket off near an edge
    if index > 0 && value < edges[index] {
        index -= 1;
    } else if index + 1 < bins && value >= edges[index + 1] {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            SongPlay::new("A", "X", "pop", 10),
            SongPlay::new("B", "Y", "pop", 30),
            SongPlay::new("C", "X", "rock", 5),
        ])
    }

    fn dataset_from_counts(counts: &[(u8, u8, u64)]) -> Dataset {
        counts
            .iter()
            .enumerate()
            .map(|(row, (artist, genre, plays))| {
                SongPlay::new(
                    &format!("song_{row}"),
                    &format!("artist_{artist}"),
                    &format!("genre_{genre}"),
                    *plays,
                )
            })
            .collect()
    }

    #[test]
    fn summary_of_small_dataset() {
        let summary = compute_summary(&sample()).expect("summary");

        assert_eq!(summary.total_plays, 45);
        assert_eq!(summary.total_songs, 3);
        assert_eq!(summary.top_song, SongPlay::new("B", "Y", "pop", 30));
        assert_eq!(summary.top_genre, "pop");
        assert_eq!(summary.top_artist, "Y");
    }

    #[test]
    fn empty_dataset_fails_top_queries_only() {
        let empty = Dataset::default();

        assert_eq!(top_song(&empty), Err(EmptyDatasetError));
        assert_eq!(top_artist(&empty), Err(EmptyDatasetError));
        assert_eq!(top_genre(&empty), Err(EmptyDatasetError));
        assert_eq!(compute_summary(&empty), Err(EmptyDatasetError));
        assert_eq!(total_plays(&empty), 0);
        assert_eq!(total_songs(&empty), 0);
        assert!(genre_totals(&empty).is_empty());
        assert!(top_n_songs(&empty, 10).is_empty());

        let histogram = play_count_histogram(&empty, HISTOGRAM_BINS);
        assert_eq!(histogram.len(), HISTOGRAM_BINS);
        assert!(histogram.iter().all(|bucket| bucket.count == 0));
    }

    #[test]
    fn top_song_tie_keeps_first_row() {
        let dataset = Dataset::new(vec![
            SongPlay::new("First", "X", "pop", 7),
            SongPlay::new("Second", "Y", "pop", 7),
        ]);

        assert_eq!(top_song(&dataset).expect("top").song_name, "First");
    }

    #[test]
    fn group_ties_keep_first_seen_name() {
        let dataset = Dataset::new(vec![
            SongPlay::new("A", "Zed", "rock", 4),
            SongPlay::new("B", "Abe", "jazz", 2),
            SongPlay::new("C", "Abe", "jazz", 2),
        ]);

        assert_eq!(top_artist(&dataset).expect("artist"), "Zed");
        assert_eq!(top_genre(&dataset).expect("genre"), "rock");

        let artists = top_n_artists_by_total(&dataset, 5);
        assert_eq!(artists[0].name, "Zed");
        assert_eq!(artists[1].name, "Abe");
    }

    #[test]
    fn top_songs_sort_is_stable_and_truncated() {
        let dataset = Dataset::new(vec![
            SongPlay::new("a", "x", "g", 1),
            SongPlay::new("b", "x", "g", 5),
            SongPlay::new("c", "x", "g", 5),
            SongPlay::new("d", "x", "g", 3),
        ]);

        let names: Vec<String> = top_n_songs(&dataset, 3)
            .into_iter()
            .map(|song| song.song_name)
            .collect();
        assert_eq!(names, vec!["b", "c", "d"]);
        assert_eq!(top_n_songs(&dataset, 10).len(), 4);
    }

    #[test]
    fn genre_totals_descend() {
        let totals = genre_totals(&sample());
        assert_eq!(
            totals,
            vec![
                GroupTotal {
                    name: String::from("pop"),
                    play_count: 40,
                },
                GroupTotal {
                    name: String::from("rock"),
                    play_count: 5,
                },
            ]
        );
    }

    #[test]
    fn genre_table_ties_keep_first_seen_order() {
        let dataset = Dataset::new(vec![
            SongPlay::new("a", "x", "rock", 3),
            SongPlay::new("b", "x", "jazz", 1),
            SongPlay::new("c", "x", "jazz", 2),
        ]);

        let names: Vec<(String, u64)> = genre_totals(&dataset)
            .into_iter()
            .map(|genre| (genre.name, genre.play_count))
            .collect();
        assert_eq!(
            names,
            vec![(String::from("rock"), 3), (String::from("jazz"), 3)]
        );
    }

    #[test]
    fn histogram_closes_last_bucket() {
        let dataset = Dataset::new(vec![
            SongPlay::new("a", "x", "g", 0),
            SongPlay::new("b", "x", "g", 10),
            SongPlay::new("c", "x", "g", 20),
        ]);

        let histogram = play_count_histogram(&dataset, 2);
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram[0].lower, 0.0);
        assert_eq!(histogram[0].upper, 10.0);
        assert_eq!(histogram[0].count, 1);
        assert_eq!(histogram[1].count, 2);
        assert_eq!(histogram[1].upper, 20.0);
    }

    #[test]
    fn single_record_lands_in_one_bucket() {
        let dataset = Dataset::new(vec![SongPlay::new("a", "x", "g", 42)]);

        for bins in [1, 2, 7, 20] {
            let histogram = play_count_histogram(&dataset, bins);
            let filled: Vec<&HistogramBucket> =
                histogram.iter().filter(|bucket| bucket.count > 0).collect();
            assert_eq!(filled.len(), 1);
            assert_eq!(filled[0].count, 1);
            assert!(filled[0].lower <= 42.0 && 42.0 <= filled[0].upper);
        }
    }

    #[test]
    fn zero_bins_behaves_as_one() {
        let histogram = play_count_histogram(&sample(), 0);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].count, 3);
    }

    #[test]
    fn analyze_uses_option_sizes() {
        let options = AnalysisOptions {
            top_songs: 2,
            top_artists: 1,
            histogram_bins: 4,
        };
        let analysis = analyze(&sample(), &options).expect("analysis");

        assert_eq!(analysis.top_songs.len(), 2);
        assert_eq!(analysis.top_artists.len(), 1);
        assert_eq!(analysis.top_artists[0].name, "Y");
        assert_eq!(analysis.histogram.len(), 4);
    }

    proptest! {
        #[test]
        fn totals_agree_across_tables(
            rows in proptest::collection::vec((0u8..6, 0u8..4, 0u64..10_000), 0..80)
        ) {
            let dataset = dataset_from_counts(&rows);
            let total = total_plays(&dataset);

            let all_songs = top_n_songs(&dataset, dataset.len());
            prop_assert_eq!(all_songs.iter().map(|song| song.play_count).sum::<u64>(), total);

            let artists = top_n_artists_by_total(&dataset, usize::MAX);
            prop_assert_eq!(artists.iter().map(|artist| artist.play_count).sum::<u64>(), total);

            let genres = genre_totals(&dataset);
            prop_assert_eq!(genres.iter().map(|genre| genre.play_count).sum::<u64>(), total);
            prop_assert!(genres.windows(2).all(|pair| pair[0].play_count >= pair[1].play_count));
        }

        #[test]
        fn top_songs_descend_with_expected_length(
            rows in proptest::collection::vec((0u8..6, 0u8..4, 0u64..500), 0..60),
            n in 0usize..80
        ) {
            let dataset = dataset_from_counts(&rows);
            let top = top_n_songs(&dataset, n);

            prop_assert_eq!(top.len(), n.min(dataset.len()));
            prop_assert!(top.windows(2).all(|pair| pair[0].play_count >= pair[1].play_count));
        }

        #[test]
        fn histogram_counts_every_song(
            rows in proptest::collection::vec((0u8..6, 0u8..4, 0u64..1_000_000), 0..120),
            bins in 1usize..40
        ) {
            let dataset = dataset_from_counts(&rows);
            let histogram = play_count_histogram(&dataset, bins);

            prop_assert_eq!(histogram.len(), bins);
            prop_assert_eq!(
                histogram.iter().map(|bucket| bucket.count).sum::<u64>(),
                total_songs(&dataset) as u64
            );
            for song in dataset.iter() {
                let value = song.play_count as f64;
                prop_assert!(histogram.iter().any(|bucket| bucket.lower <= value && value <= bucket.upper));
            }
        }
    }
}
