use std::fs;
use tempfile::tempdir;
use wrapped::dataset::load_dataset;
use wrapped::stats::{self, AnalysisOptions};

#[test]
fn csv_file_flows_into_analysis() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("popular_songs.csv");
    let mut raw = String::from("song_name,artist,genre,play_count\n");
    for n in 0..25_u64 {
        raw.push_str(&format!("Song {n},Artist {},genre {},{}\n", n % 7, n % 3, n * 40));
    }
    fs::write(&path, raw).expect("write");

    let dataset = load_dataset(&path).expect("load");
    let analysis = stats::analyze(&dataset, &AnalysisOptions::default()).expect("analysis");

    assert_eq!(analysis.summary.total_songs, 25);
    assert_eq!(analysis.summary.total_plays, (0..25_u64).map(|n| n * 40).sum::<u64>());
    assert_eq!(analysis.summary.top_song.song_name, "Song 24");
    assert_eq!(analysis.top_songs.len(), 10);
    assert_eq!(analysis.top_artists.len(), 5);
    assert_eq!(analysis.genres.len(), 3);
    assert_eq!(
        analysis.histogram.iter().map(|bucket| bucket.count).sum::<u64>(),
        25
    );
    assert_eq!(analysis.histogram[0].lower, 0.0);
    assert_eq!(analysis.histogram[19].upper, 960.0);
}

#[test]
fn shared_snapshot_is_read_concurrently() {
    let dataset = wrapped::Dataset::new(vec![
        wrapped::SongPlay::new("A", "X", "pop", 10),
        wrapped::SongPlay::new("B", "Y", "rock", 20),
    ]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dataset = dataset.clone();
            std::thread::spawn(move || stats::total_plays(&dataset))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("join"), 30);
    }
}
