use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use raze_analyze::phash::phash64;
use raze_analyze::simhash::simhash64;
use raze_analyze::{
    ClusterKind, ContentHash, FileId, FileRecord, Fingerprint, PlainTextExcerpts,
    SimilarityConfig, SimilarityDetector, cluster_by_hamming, find_exact_duplicates,
    hamming_distance,
};
use tempfile::TempDir;

const BUDGET_NOTE: &str = "Quarterly budget review for the platform team. Hosting costs rose \
eleven percent after the storage migration, while compute spend stayed flat thanks to reserved \
instances. The team recommends archiving cold logs to cheaper tiers, consolidating staging \
clusters, and revisiting the backup retention policy before the next planning cycle begins in March.";

const GARDEN_NOTE: &str = "Meeting notes: the garden club will plant tulips along the north \
fence, repaint the shed, and order new compost bins before spring.";

fn record_for(path: &Path, mime: &str, hash: Option<ContentHash>) -> FileRecord {
    FileRecord {
        id: FileId::from_path(path),
        path: path.to_path_buf(),
        size: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        mtime: 0.0,
        mime_type: mime.to_string(),
        content_hash: hash,
    }
}

fn write_gray(path: &Path, f: impl Fn(u32, u32) -> u8) {
    GrayImage::from_fn(32, 32, |x, y| Luma([f(x, y)]))
        .save(path)
        .unwrap();
}

fn pattern_a(x: u32, y: u32) -> u8 {
    ((x * x + 2 * y * y + 3 * x * y) % 251) as u8
}

/// Writes four fixture images: a gradient, a lightly edited copy, a
/// checkerboard and a bright quadrant.
fn image_fixtures(dir: &Path) -> Vec<PathBuf> {
    let paths: Vec<PathBuf> = ["a.png", "b.png", "c.png", "d.png"]
        .iter()
        .map(|n| dir.join(n))
        .collect();
    write_gray(&paths[0], pattern_a);
    write_gray(&paths[1], |x, y| {
        if x == y {
            pattern_a(x, y).saturating_add(4)
        } else {
            pattern_a(x, y)
        }
    });
    write_gray(&paths[2], |x, y| if ((x / 4) + (y / 4)) % 2 == 0 { 255 } else { 0 });
    write_gray(&paths[3], |x, y| if x < 16 && y < 16 { 230 } else { 20 });
    paths
}

#[test]
fn test_one_word_edit_is_near_duplicate() {
    let original = simhash64(BUDGET_NOTE, 3);
    let edited = simhash64(&BUDGET_NOTE.replace("eleven", "twelve"), 3);
    let unrelated = simhash64(GARDEN_NOTE, 3);

    assert_eq!(hamming_distance(original, edited), 5);
    assert!(hamming_distance(original, unrelated) > 8);
}

#[test]
fn test_detector_clusters_near_duplicate_files() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    let c = temp.path().join("c.txt");
    fs::write(&a, BUDGET_NOTE).unwrap();
    fs::write(&b, BUDGET_NOTE.replace("eleven", "twelve")).unwrap();
    fs::write(&c, GARDEN_NOTE).unwrap();

    let records: Vec<FileRecord> = [&a, &b, &c]
        .iter()
        .map(|p| record_for(p, "text/plain", None))
        .collect();

    let detector = SimilarityDetector::new();
    let text = detector.scan_text(&records, &PlainTextExcerpts::new());
    assert_eq!(text.fingerprints.len(), 3);
    assert_eq!(text.excerpts.len(), 3);

    let detections = detector.detect(&records, &text.fingerprints, &[]);
    assert_eq!(detections.text.len(), 1);
    assert_eq!(detections.text[0].kind, ClusterKind::Text);
    assert_eq!(
        detections.text[0].file_ids,
        vec![records[0].id.clone(), records[1].id.clone()]
    );
    assert!(detections.image.is_empty());
}

#[test]
fn test_wordless_files_are_not_fingerprinted() {
    let temp = TempDir::new().unwrap();
    let punct = temp.path().join("punct.txt");
    let blank = temp.path().join("blank.txt");
    let note = temp.path().join("note.txt");
    fs::write(&punct, "... !!! ---").unwrap();
    fs::write(&blank, "   \n\t\n").unwrap();
    fs::write(&note, GARDEN_NOTE).unwrap();

    let records: Vec<FileRecord> = [&punct, &blank, &note]
        .iter()
        .map(|p| record_for(p, "text/plain", None))
        .collect();

    let detector = SimilarityDetector::new();
    let text = detector.scan_text(&records, &PlainTextExcerpts::new());
    assert_eq!(text.fingerprints.len(), 1);
    assert_eq!(text.fingerprints[0].file_id, records[2].id);
    assert!(!text.excerpts.contains_key(&records[0].id));
    assert!(!text.excerpts.contains_key(&records[1].id));

    let detections = detector.detect(&records, &text.fingerprints, &[]);
    assert!(detections.text.is_empty());
}

#[test]
fn test_excerpts_are_truncated() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("long.txt");
    fs::write(&path, BUDGET_NOTE).unwrap();
    let records = vec![record_for(&path, "text/plain", None)];

    let config = SimilarityConfig::builder().excerpt_chars(10usize).build().unwrap();
    let detector = SimilarityDetector::with_config(config);
    let text = detector.scan_text(&records, &PlainTextExcerpts::new());

    assert_eq!(text.excerpts[&records[0].id], "Quarterly ");
    // The fingerprint covers the full text, not the excerpt.
    assert_eq!(text.fingerprints[0].hash, simhash64(BUDGET_NOTE, 3));
}

#[test]
fn test_phash_fixture_distances() {
    let temp = TempDir::new().unwrap();
    let paths = image_fixtures(temp.path());
    let hashes: Vec<u64> = paths.iter().map(|p| phash64(p).unwrap()).collect();

    assert_eq!(hashes[0], 0x1e06_0e0c_1e1e_7d7e);
    assert_eq!(hamming_distance(hashes[0], hashes[1]), 0);
    assert_eq!(hamming_distance(hashes[0], hashes[2]), 33);
    assert_eq!(hamming_distance(hashes[0], hashes[3]), 36);
    assert_eq!(hamming_distance(hashes[2], hashes[3]), 13);
}

#[test]
fn test_image_clusters_and_undecodable_files() {
    let temp = TempDir::new().unwrap();
    let mut paths = image_fixtures(temp.path());
    let broken = temp.path().join("broken.jpg");
    fs::write(&broken, b"not really a jpeg").unwrap();
    paths.push(broken);

    let records: Vec<FileRecord> = paths
        .iter()
        .map(|p| record_for(p, "image/png", None))
        .collect();

    let detector = SimilarityDetector::new();
    let images = detector.image_fingerprints(&records);
    assert_eq!(images.len(), 4);

    let detections = detector.detect(&records, &[], &images);
    assert_eq!(detections.image.len(), 1);
    assert_eq!(
        detections.image[0].file_ids,
        vec![records[0].id.clone(), records[1].id.clone()]
    );
}

#[test]
fn test_exact_groups_skip_unhashed_records() {
    let temp = TempDir::new().unwrap();
    let mut records = Vec::new();
    for (name, hash) in [("x", Some(1u8)), ("y", Some(1)), ("z", None), ("w", None)] {
        let path = temp.path().join(name);
        fs::write(&path, "same").unwrap();
        records.push(record_for(&path, "text/plain", hash.map(|b| ContentHash::new([b; 32]))));
    }

    let report = find_exact_duplicates(&records);
    assert_eq!(report.group_count, 1);
    for group in &report.groups {
        assert!(group.count() >= 2);
    }
    assert_eq!(report.groups[0].file_ids, vec![records[0].id.clone(), records[1].id.clone()]);
}

/// Deterministic 64-bit values for property checks.
fn pseudo_random(n: usize) -> Vec<u64> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        })
        .collect()
}

#[test]
fn test_hamming_symmetry_and_identity() {
    let values = pseudo_random(32);
    for &a in &values {
        assert_eq!(hamming_distance(a, a), 0);
        for &b in &values {
            assert_eq!(hamming_distance(a, b), hamming_distance(b, a));
        }
    }
}

#[test]
fn test_first_seed_cluster_grows_with_threshold() {
    let items: Vec<Fingerprint> = pseudo_random(40)
        .into_iter()
        .enumerate()
        .map(|(i, h)| Fingerprint::new(FileId::from(format!("f{i}")), h))
        .collect();

    let mut previous: Vec<FileId> = Vec::new();
    for threshold in 0..=64 {
        let clusters = cluster_by_hamming(&items, threshold, ClusterKind::Text);
        let current = clusters
            .first()
            .filter(|c| c.seed() == Some(&items[0].file_id))
            .map(|c| c.file_ids.clone())
            .unwrap_or_default();
        for id in &previous {
            assert!(current.contains(id), "threshold {threshold} dropped {id}");
        }
        previous = current;
    }
    assert_eq!(previous.len(), items.len());
}

#[test]
fn test_separated_groups_are_stable_across_thresholds() {
    // Two groups seeded at opposite corners; members are at most 3 bits from their seed.
    let items = vec![
        Fingerprint::new(FileId::from("low-seed"), 0),
        Fingerprint::new(FileId::from("high-seed"), u64::MAX),
        Fingerprint::new(FileId::from("low-1"), 0b1),
        Fingerprint::new(FileId::from("high-1"), u64::MAX ^ 0b110),
        Fingerprint::new(FileId::from("low-2"), 0b111),
        Fingerprint::new(FileId::from("high-2"), u64::MAX ^ 0b1),
    ];

    for threshold in 3..=60 {
        let clusters = cluster_by_hamming(&items, threshold, ClusterKind::Image);
        assert_eq!(clusters.len(), 2, "threshold {threshold}");
        let low: Vec<&str> = clusters[0].file_ids.iter().map(FileId::as_str).collect();
        let high: Vec<&str> = clusters[1].file_ids.iter().map(FileId::as_str).collect();
        assert_eq!(low, vec!["low-seed", "low-1", "low-2"]);
        assert_eq!(high, vec!["high-seed", "high-1", "high-2"]);
    }
}
