//! End-to-end assign workflow: barcode file + FASTQ in, per-read TSV and
//! annotated FASTQ out.

use std::fs;
use std::io::Write;

use barcode_match::cli::assign::{run, Algorithm, AssignArgs};
use barcode_match::cli::OutputFormat;

fn write_file(path: &std::path::Path, content: &str) {
    let mut file = fs::File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

#[test]
fn assign_writes_tsv_and_annotated_fastq() {
    let dir = tempfile::tempdir().unwrap();
    let barcodes = dir.path().join("barcodes.tsv");
    let fastq = dir.path().join("reads.fastq");
    let output = dir.path().join("assignments.tsv");
    let annotated = dir.path().join("annotated.fastq");

    write_file(&barcodes, "s1\tACGT\ns2\tTTTT\n");
    write_file(
        &fastq,
        concat!(
            "@read1\nACGTGGGG\n+\nIIIIIIII\n", // exact match to s1
            "@read2\nTTATGGGG\n+\nIIIIIIII\n", // one mismatch to s2
            "@read3\nGCGCGGGG\n+\nIIIIIIII\n", // nothing within budget
            "@read4\nAC\n+\nII\n",             // shorter than the window
        ),
    );

    let args = AssignArgs {
        fastq: fastq.clone(),
        barcodes: barcodes.clone(),
        start: 0,
        algorithm: Algorithm::Chunked,
        max_mismatches: 1,
        chunks: 2,
        batch_size: 2,
        output: Some(output.clone()),
        annotated_fastq: Some(annotated.clone()),
        delimiter: ':',
    };
    run(args, OutputFormat::Text, false).unwrap();

    let tsv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines[0], "read\tbarcode_index\tlabel\tbest_dist\tnext_dist");
    assert_eq!(lines[1], "read1\t0\ts1\t0\t63");
    assert_eq!(lines[2], "read2\t1\ts2\t1\t63");
    assert_eq!(lines[3], "read3\t*\t*\t63\t63");
    assert_eq!(lines[4], "read4\t*\t*\t63\t63");
    assert_eq!(lines.len(), 5);

    // Only matched reads reach the annotated FASTQ, labels in the names
    let fastq_out = fs::read_to_string(&annotated).unwrap();
    assert_eq!(
        fastq_out,
        "@read1:s1\nACGTGGGG\n+\nIIIIIIII\n@read2:s2\nTTATGGGG\n+\nIIIIIIII\n"
    );
}

#[test]
fn assign_with_bare_barcodes_reports_sequences_as_labels() {
    let dir = tempfile::tempdir().unwrap();
    let barcodes = dir.path().join("barcodes.txt");
    let fastq = dir.path().join("reads.fastq");
    let output = dir.path().join("assignments.tsv");

    write_file(&barcodes, "ACGT\nTTTT\n");
    write_file(&fastq, "@read1\nTTTTAAAA\n+\nIIIIIIII\n");

    let args = AssignArgs {
        fastq: fastq.clone(),
        barcodes: barcodes.clone(),
        start: 0,
        algorithm: Algorithm::List,
        max_mismatches: 1,
        chunks: 2,
        batch_size: 100,
        output: Some(output.clone()),
        annotated_fastq: None,
        delimiter: ':',
    };
    run(args, OutputFormat::Text, false).unwrap();

    let tsv = fs::read_to_string(&output).unwrap();
    // List matcher has no budget: the runner-up distance is the true 4
    assert!(tsv.lines().any(|line| line == "read1\t1\tTTTT\t0\t4"));
}

#[test]
fn assign_with_window_offset_and_gzip() {
    let dir = tempfile::tempdir().unwrap();
    let barcodes = dir.path().join("barcodes.tsv");
    let fastq = dir.path().join("reads.fastq.gz");
    let output = dir.path().join("assignments.tsv");

    write_file(&barcodes, "s1\tACGT\n");

    let file = fs::File::create(&fastq).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder
        .write_all(b"@read1\nGGGGACGTGG\n+\nIIIIIIIIII\n")
        .unwrap();
    encoder.finish().unwrap();

    let args = AssignArgs {
        fastq: fastq.clone(),
        barcodes: barcodes.clone(),
        start: 4,
        algorithm: Algorithm::Chunked,
        max_mismatches: 1,
        chunks: 2,
        batch_size: 100,
        output: Some(output.clone()),
        annotated_fastq: None,
        delimiter: ':',
    };
    run(args, OutputFormat::Json, false).unwrap();

    let tsv = fs::read_to_string(&output).unwrap();
    assert!(tsv.lines().any(|line| line == "read1\t0\ts1\t0\t63"));
}
