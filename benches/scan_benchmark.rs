use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use metasniff::client::SnapshotClient;
use metasniff::config::{ExtractionConfig, RetryPolicy};
use metasniff::data::{FOLDER_MIME_TYPE, FileRecord, RemoteEntry};
use metasniff::hash::compute_hash;
use metasniff::session::{ExtractionSession, RunOutcome};
use std::sync::Arc;

/// Builds a listing with `branching` subfolders per folder down to `depth`,
/// and `files_per_dir` files in every folder.
fn create_tree(depth: usize, branching: usize, files_per_dir: usize) -> Vec<RemoteEntry> {
    fn fill(
        entries: &mut Vec<RemoteEntry>,
        parent: &str,
        depth: usize,
        branching: usize,
        files_per_dir: usize,
    ) {
        for i in 0..files_per_dir {
            entries.push(RemoteEntry {
                id: format!("{parent}-file{i}"),
                name: format!("file_{i}.txt"),
                mime_type: "text/plain".into(),
                size: Some(1024 + i as u64),
                md5_checksum: Some(format!("{:032x}", i)),
                parents: vec![parent.to_string()],
                ..Default::default()
            });
        }
        if depth == 0 {
            return;
        }
        for i in 0..branching {
            let id = format!("{parent}-dir{i}");
            entries.push(RemoteEntry {
                id: id.clone(),
                name: format!("subdir_{i}"),
                mime_type: FOLDER_MIME_TYPE.into(),
                parents: vec![parent.to_string()],
                ..Default::default()
            });
            fill(entries, &id, depth - 1, branching, files_per_dir);
        }
    }

    let mut entries = vec![RemoteEntry {
        id: "root".into(),
        name: "Root".into(),
        mime_type: FOLDER_MIME_TYPE.into(),
        ..Default::default()
    }];
    fill(&mut entries, "root", depth, branching, files_per_dir);
    entries
}

fn records(count: usize) -> Vec<FileRecord> {
    (0..count)
        .map(|i| {
            FileRecord::from_entry(
                RemoteEntry {
                    id: format!("{:08}", (i * 7919) % count),
                    name: format!("file_{i}.pdf"),
                    mime_type: "application/pdf".into(),
                    size: Some(i as u64),
                    created_time: Some("2024-01-01T00:00:00Z".into()),
                    description: (i % 3 == 0).then(|| "exhibit | note".to_string()),
                    ..Default::default()
                },
                format!("Root/file_{i}.pdf"),
            )
        })
        .collect()
}

fn benchmark_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_hash");
    for count in [1_000, 10_000] {
        let input = records(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| compute_hash(black_box(input)))
        });
    }
    group.finish();
}

fn benchmark_traversal(c: &mut Criterion) {
    let client = Arc::new(SnapshotClient::from_entries(create_tree(3, 4, 10)).with_page_size(25));
    let mut group = c.benchmark_group("traversal");
    group.sample_size(20);

    for workers in [1, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            b.iter(|| {
                let config = ExtractionConfig::new(Some("root".into()))
                    .with_workers(workers)
                    .with_retry(RetryPolicy::immediate(1));
                let session = ExtractionSession::new(client.clone(), config).unwrap();
                match session.run().unwrap() {
                    RunOutcome::Completed(report) => black_box(report.records.len()),
                    RunOutcome::Stopped => unreachable!(),
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_hashing, benchmark_traversal);
criterion_main!(benches);
