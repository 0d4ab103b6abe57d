//! End-to-end tests of the annotation pipeline through the library API.

use tempfile::TempDir;
use utrext_lib::annotate::{AnnotationPipeline, AnnotationSet, Outcome};
use utrext_lib::config::{AnnotationConfig, UtrPolicy};
use utrext_lib::errors::UtrError;
use utrext_lib::feature::{Dialect, Peak, Strand};
use utrext_lib::gateway::InMemoryFeatureDb;
use utrext_lib::metrics::AnnotationMetrics;
use utrext_lib::peaks::read_peaks_from_path;

use crate::helpers::{ANNOTATION_GFF3, ANNOTATION_GTF, many_peaks, write_cache, write_inputs};

fn config(processors: usize) -> AnnotationConfig {
    AnnotationConfig { processors, ..AnnotationConfig::default() }
}

/// Runs the pipeline to completion, returning outcomes sorted by their debug rendering.
fn run(
    db: &InMemoryFeatureDb,
    config: AnnotationConfig,
    cache_dir: &std::path::Path,
    peaks: &[Peak],
) -> (Vec<Outcome>, AnnotationMetrics) {
    let pipeline = AnnotationPipeline::new(db.clone(), config).with_cache_dir(cache_dir);
    let mut running = pipeline.start(peaks).unwrap();
    let mut outcomes: Vec<Outcome> = running.by_ref().collect();
    let metrics = running.finish().unwrap();
    outcomes.sort_by_cached_key(|o| format!("{o:?}"));
    (outcomes, metrics)
}

#[test]
fn test_one_outcome_per_peak() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(dir.path());
    let db = InMemoryFeatureDb::from_path(&inputs.annotation, Dialect::Gff3).unwrap();
    let peaks = read_peaks_from_path(&inputs.peaks).unwrap();

    let (outcomes, metrics) = run(&db, config(2), &inputs.cache_dir, &peaks);
    assert_eq!(outcomes.len(), 5);

    let by_peak = |name: &str| outcomes.iter().find(|o| o.peak() == name).unwrap();
    let utr = by_peak("pA").record().and_then(|r| r.utr.clone()).unwrap();
    assert_eq!((utr.start, utr.end), (2000, 2300));
    assert_eq!(utr.attribute("colour"), Some("4"));
    assert_eq!(by_peak("pB"), &Outcome::NoNearbyFeatures { peak: "pB".to_string() });
    assert_eq!(by_peak("pC"), &Outcome::NoUtr { peak: "pC".to_string() });
    let reverse = by_peak("pD").record().unwrap();
    let utr = reverse.utr.as_ref().unwrap();
    assert_eq!((utr.start, utr.end), (5600, 6000));
    assert_eq!(reverse.gene.start, 5600);
    assert_eq!(by_peak("pE"), &Outcome::PotentialUtrZeroCoverage { peak: "pE".to_string() });

    assert_eq!(
        metrics,
        AnnotationMetrics {
            total_peaks: 5,
            utrs_annotated: 2,
            peaks_no_nearby_features: 1,
            peaks_zero_coverage: 1,
            peaks_no_utr: 1,
            peaks_within_transcript: 1,
            ..AnnotationMetrics::default()
        }
    );
}

#[test]
fn test_worker_count_does_not_change_results() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(dir.path());
    let db = InMemoryFeatureDb::from_path(&inputs.annotation, Dialect::Gff3).unwrap();
    let peaks = many_peaks(200);

    let (single, single_metrics) = run(&db, config(1), &inputs.cache_dir, &peaks);
    for processors in [2, 3, 8] {
        let small_queue = AnnotationConfig { queue_capacity: Some(1), ..config(processors) };
        let (outcomes, metrics) = run(&db, small_queue, &inputs.cache_dir, &peaks);
        assert_eq!(outcomes, single, "outcomes differ with {processors} workers");
        assert_eq!(metrics, single_metrics, "metrics differ with {processors} workers");
    }
    assert_eq!(single.len(), 200);
    // Counters count distinct peak names, not outcomes.
    assert!(single_metrics.peaks_no_nearby_features <= 13);
}

#[test]
fn test_merged_output_keeps_every_gene() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(dir.path());
    let db = InMemoryFeatureDb::from_path(&inputs.annotation, Dialect::Gff3).unwrap();
    let peaks = read_peaks_from_path(&inputs.peaks).unwrap();

    let (outcomes, _) = run(&db, config(3), &inputs.cache_dir, &peaks);
    let mut set = AnnotationSet::new();
    for outcome in outcomes {
        set.add_outcome(outcome);
    }
    assert_eq!(set.len(), 2);

    let lines = set.merged_lines(&db, Dialect::Gff3).unwrap();
    let gene_lines: Vec<_> = lines.iter().filter(|l| l.split('\t').nth(2) == Some("gene")).collect();
    assert_eq!(gene_lines.len(), 4);
    assert!(gene_lines[0].contains("\t1000\t2300\t") && gene_lines[0].contains("Name=alpha"));
    let utr_lines: Vec<_> = lines.iter().filter(|l| l.contains("three_prime_UTR")).collect();
    assert_eq!(utr_lines.len(), 2);
    assert!(utr_lines.iter().all(|l| l.split('\t').nth(1) == Some("utrext")));
    assert!(lines.iter().any(|l| l.contains("ID=e1;Parent=t1")));
}

#[test]
fn test_gtf_annotation() {
    let dir = TempDir::new().unwrap();
    let annotation = dir.path().join("genes.gtf");
    std::fs::write(&annotation, ANNOTATION_GTF).unwrap();
    let cache_dir = write_cache(dir.path());
    let db = InMemoryFeatureDb::from_path(&annotation, Dialect::Gtf).unwrap();
    let peaks = vec![Peak::new("chr1", 1900, 2400, Strand::Forward, "pA")];

    let config = AnnotationConfig { gtf_in: true, ..config(1) };
    let (outcomes, metrics) = run(&db, config, &cache_dir, &peaks);
    assert_eq!(metrics.utrs_annotated, 1);
    let record = outcomes[0].record().unwrap();
    assert_eq!(record.transcript.as_ref().map(|t| t.id.as_str()), Some("t1"));

    let mut set = AnnotationSet::new();
    set.add_outcome(outcomes[0].clone());
    let lines = set.merged_lines(&db, Dialect::Gtf).unwrap();
    let utr = lines.iter().find(|l| l.contains("three_prime_UTR")).unwrap();
    assert!(utr.contains(r#"gene_id "g1"; transcript_id "t1";"#));
}

#[test]
fn test_extend_policy_accepts_peak_over_existing_utr() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(dir.path());
    let annotation = format!(
        "{}chr1\ttest\tthree_prime_UTR\t1900\t2000\t.\t+\t.\tID=u1;Parent=t1\n",
        ANNOTATION_GFF3
    );
    std::fs::write(&inputs.annotation, annotation).unwrap();
    let db = InMemoryFeatureDb::from_path(&inputs.annotation, Dialect::Gff3).unwrap();
    let peaks = vec![Peak::new("chr1", 1950, 2200, Strand::Forward, "pU")];

    let (outcomes, metrics) = run(&db, config(1), &inputs.cache_dir, &peaks);
    assert_eq!(outcomes, vec![Outcome::NoUtr { peak: "pU".to_string() }]);
    assert_eq!(metrics.peaks_utr_already_annotated, 1);

    let extend = AnnotationConfig { utr_policy: UtrPolicy::Extend, ..config(1) };
    let (outcomes, _) = run(&db, extend, &inputs.cache_dir, &peaks);
    let utr = outcomes[0].record().and_then(|r| r.utr.as_ref()).unwrap();
    assert_eq!(utr.id, "utr_2");
    assert_eq!((utr.start, utr.end), (2000, 2200));
}

#[test]
fn test_missing_cache_dir_fails_before_workers_start() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(dir.path());
    let db = InMemoryFeatureDb::from_path(&inputs.annotation, Dialect::Gff3).unwrap();
    let peaks = read_peaks_from_path(&inputs.peaks).unwrap();

    let pipeline = AnnotationPipeline::new(db.clone(), config(2));
    let err = pipeline.start(&peaks).err().unwrap();
    assert!(matches!(err.downcast_ref::<UtrError>(), Some(UtrError::MissingCacheDir { .. })));

    let no_workers = AnnotationPipeline::new(db, config(0)).with_cache_dir(&inputs.cache_dir);
    assert!(no_workers.start(&peaks).is_err());
}

#[test]
fn test_missing_cache_file_fails_run() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(dir.path());
    std::fs::remove_file(inputs.cache_dir.join("reverse_coverage_gaps.bed")).unwrap();
    let db = InMemoryFeatureDb::from_path(&inputs.annotation, Dialect::Gff3).unwrap();
    let peaks = read_peaks_from_path(&inputs.peaks).unwrap();

    let pipeline = AnnotationPipeline::new(db, config(2)).with_cache_dir(&inputs.cache_dir);
    let mut running = pipeline.start(&peaks).unwrap();
    assert!(running.next().is_none());
    let err = running.finish().unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("2 of 2 annotation workers failed"));
    assert!(msg.contains("reverse strand coverage gaps"));
}
