//! Submission Test Suite
//!
//! End-to-end checks of the submission pipeline over on-disk fixtures:
//! row validation, multi-level assembly, flat-file CON records and the
//! submission-wide fatal conditions.

use std::fs;
use std::path::PathBuf;

use agp_assembler::core::message::codes;
use agp_assembler::submission::config::SubmissionConfig;
use agp_assembler::{
    AssemblyError, AssemblyLevel, AssemblyType, FileType, Submission, SubmissionError,
    SubmissionOptions,
};
use tempfile::TempDir;

const SCENARIO_A: &str = "SCAFF1\t1\t330\t1\tW\tCTG1\t1\t330\t+\n\
                          SCAFF1\t331\t354\t2\tN\t24\tscaffold\tyes\tpaired-ends\n";

const CONTIGS: &str = ">ctg1\nAAAAACCCCC\n>ctg2\nGGGGG\n>ctg3\nTTTTTTTT\n";

const SCAFFOLDS: &str = "scaf1\t1\t10\t1\tW\tctg1\t1\t10\t+\n\
                         scaf1\t11\t13\t2\tN\t3\tscaffold\tyes\tpaired-ends\n\
                         scaf1\t14\t18\t3\tW\tctg2\t1\t5\t-\n";

const CHROMOSOMES: &str = "chr1_obj\t1\t18\t1\tW\tscaf1\t1\t18\t+\n\
                           chr1_obj\t19\t28\t2\tN\t10\tcontig\tno\tna\n\
                           chr1_obj\t29\t32\t3\tW\tctg3\t3\t6\t+\n";

fn fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn validate_only(agp: &str) -> agp_assembler::SubmissionOutcome {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "rows.agp", agp);
    Submission::default()
        .with_file(&path, FileType::Agp)
        .run(&SubmissionOptions::default())
        .expect("Validation pass failed")
}

/// A well-formed scaffold with one component and one gap
#[test]
fn test_scenario_a_validates_and_assembles() {
    let outcome = validate_only(SCENARIO_A);
    assert!(outcome.report.is_empty(), "{:?}", outcome.report.messages);
    assert_eq!(outcome.genome_size, 354);

    let dir = TempDir::new().unwrap();
    let agp = fixture(&dir, "scaff.agp", SCENARIO_A);
    let fasta = fixture(&dir, "ctg.fa", &format!(">CTG1\n{}\n", "ACGT".repeat(82) + "AC"));
    let outcome = Submission::default()
        .with_file(&agp, FileType::Agp)
        .with_file(&fasta, FileType::Fasta)
        .run(&SubmissionOptions {
            assemble: true,
            fasta_output: None,
        })
        .unwrap();
    let scaffold = outcome
        .sequences
        .iter()
        .find(|s| s.name == "SCAFF1")
        .expect("SCAFF1 was not assembled");
    assert_eq!(scaffold.length, 354);
}

/// A gap length disagreeing with its object interval reports both values once
#[test]
fn test_scenario_b_gap_length_mismatch() {
    let outcome = validate_only(&SCENARIO_A.replace("\t24\tscaffold", "\t21\tscaffold"));
    assert_eq!(outcome.report.len(), 1);
    let message = &outcome.report.messages[0];
    assert_eq!(message.code, codes::AGP_GAP_LENGTH);
    assert!(message.message.contains("21"));
    assert!(message.message.contains("24"));
    assert!(!outcome.complete);
}

/// Invalid component type and orientation are reported independently
#[test]
fn test_scenario_c_independent_errors() {
    let outcome = validate_only("SCAFF1\t1\t330\t1\tX\tCTG1\t1\t330\t#\n");
    assert!(outcome.report.count_code(codes::AGP_COMPONENT_TYPE) >= 1);
    assert!(outcome.report.count_code(codes::AGP_ORIENTATION) >= 1);
    assert!(outcome.report.error_count() >= 2);
}

/// A structurally broken row is one invalid-row error and nothing else
#[test]
fn test_scenario_d_invalid_row() {
    let outcome = validate_only(&format!("{SCENARIO_A}SCAFF2\t\t\n"));
    assert_eq!(outcome.report.len(), 1, "{:?}", outcome.report.messages);
    assert_eq!(outcome.report.count_code(codes::AGP_INVALID_ROW), 1);
    assert_eq!(outcome.report.messages[0].origin.line, Some(3));
}

/// Contigs -> scaffold -> chromosome across two AGP files and a chromosome list
#[test]
fn test_multi_level_assembly() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("assembled.fa");
    let submission = Submission::default()
        .with_file(fixture(&dir, "contigs.fa", CONTIGS), FileType::Fasta)
        .with_file(fixture(&dir, "chromosomes.agp", CHROMOSOMES), FileType::Agp)
        .with_file(fixture(&dir, "scaffolds.agp", SCAFFOLDS), FileType::Agp)
        .with_file(
            fixture(&dir, "chromosomes.txt", "chr1_obj\t1\tchromosome\n"),
            FileType::ChromosomeList,
        );

    let outcome = submission
        .run(&SubmissionOptions {
            assemble: true,
            fasta_output: Some(output.clone()),
        })
        .unwrap();
    assert!(outcome.report.is_empty(), "{:?}", outcome.report.messages);
    assert!(outcome.complete);
    assert_eq!(outcome.genome_size, 32);
    assert!(outcome.unplaced.is_empty());

    let level = |name: &str| {
        outcome
            .sequences
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.level)
    };
    assert_eq!(level("ctg1"), Some(AssemblyLevel::Contig));
    assert_eq!(level("scaf1"), Some(AssemblyLevel::Scaffold));
    assert_eq!(level("chr1_obj"), Some(AssemblyLevel::Chromosome));

    assert_eq!(outcome.fasta_records, 2);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        ">chr1_obj\nAAAAACCCCCNNNCCCCCNNNNNNNNNNTTTT\n>scaf1\nAAAAACCCCCNNNCCCCC\n"
    );
}

/// A component placed by two objects contributes the same bytes to both
#[test]
fn test_shared_component_is_identical_in_both_parents() {
    use agp_assembler::core::message::ValidationReport;
    use agp_assembler::parsing::agp::AgpParser;
    use agp_assembler::{Assembler, PlacementIndex};

    let mut report = ValidationReport::new();
    let rows = AgpParser::new("shared.agp").parse_text(
        "left\t1\t6\t1\tW\tshared\t3\t8\t+\n\
         right\t1\t2\t1\tW\tother\t1\t2\t+\n\
         right\t3\t8\t2\tW\tshared\t3\t8\t+\n",
        &mut report,
    );
    assert!(report.is_empty());

    let mut assembler = Assembler::new(PlacementIndex::open_in_memory().unwrap());
    assembler.ingest_rows(&rows).unwrap();
    assembler.add_component("other", Some(b"GG")).unwrap();
    assembler.add_component("shared", Some(b"ACGTTGCAAC")).unwrap();
    assert!(assembler.sequence("left").unwrap().is_none());
    assert_eq!(assembler.seal().unwrap().len(), 2);

    let left = assembler.sequence("left").unwrap().unwrap();
    let right = assembler.sequence("right").unwrap().unwrap();
    assert_eq!(left, b"GTTGCA".to_vec());
    assert_eq!(&right[2..], left.as_slice());
    assert_eq!(assembler.finish().unwrap().len(), 4);
    assembler.close().unwrap();
}

/// CON records in an EMBL flat file are assembled from sequence records in the same file
#[test]
fn test_flatfile_con_record() {
    let dir = TempDir::new().unwrap();
    let embl = "\
AC   * scaffold_1
XX
CO   join(ctg1:1..8,gap(4),
CO   complement(ctg2:1..6))
//
AC   * ctg1
XX
SQ   Sequence 8 BP; 2 A; 2 C; 2 G; 2 T; 0 other;
     acgtacgt                                                                  8
//
AC   * ctg2
XX
SQ   Sequence 6 BP; 2 A; 2 C; 2 G; 0 T; 0 other;
     ggccaa                                                                    6
//
";
    let output = dir.path().join("out.fa");
    let outcome = Submission::default()
        .with_file(fixture(&dir, "entries.embl", embl), FileType::FlatFile)
        .run(&SubmissionOptions {
            assemble: true,
            fasta_output: Some(output.clone()),
        })
        .unwrap();
    assert!(outcome.report.is_empty(), "{:?}", outcome.report.messages);
    assert_eq!(outcome.genome_size, 18);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        ">scaffold_1\nacgtacgtNNNNttggcc\n"
    );
}

/// Names repeated across files abort the pass with every duplicate listed,
/// in the order the files are read: sequences before AGP rows
#[test]
fn test_duplicate_names_fail_once() {
    let dir = TempDir::new().unwrap();
    let result = Submission::default()
        .with_file(fixture(&dir, "scaffolds.agp", SCAFFOLDS), FileType::Agp)
        .with_file(fixture(&dir, "contigs.fa", CONTIGS), FileType::Fasta)
        .with_file(fixture(&dir, "again.fa", ">scaf1\nACGT\n>ctg3\nAC\n"), FileType::Fasta)
        .run(&SubmissionOptions {
            assemble: true,
            fasta_output: None,
        });

    let duplicates = match result {
        Err(SubmissionError::DuplicateNames { duplicates }) => duplicates,
        other => panic!("expected duplicate names, got {other:?}"),
    };
    let names: Vec<&str> = duplicates.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["ctg3", "scaf1"]);
    let message = SubmissionError::DuplicateNames { duplicates }.to_string();
    assert!(message.contains("scaf1") && message.contains("ctg3"));
}

/// A scaffold whose contig never arrives names both the contig and the scaffold
#[test]
fn test_unresolved_component_is_fatal() {
    let dir = TempDir::new().unwrap();
    let result = Submission::default()
        .with_file(fixture(&dir, "scaffolds.agp", SCAFFOLDS), FileType::Agp)
        .with_file(fixture(&dir, "partial.fa", ">ctg1\nAAAAACCCCC\n"), FileType::Fasta)
        .run(&SubmissionOptions {
            assemble: true,
            fasta_output: None,
        });
    match result {
        Err(SubmissionError::Assembly(AssemblyError::MissingComponent { component, object })) => {
            assert_eq!(component, "ctg2");
            assert_eq!(object, "scaf1");
        }
        other => panic!("expected a missing component, got {other:?}"),
    }
}

/// COVID-19 outbreak submissions are capped at the configured genome size
#[test]
fn test_covid_genome_size_ceiling() {
    let dir = TempDir::new().unwrap();
    let config = SubmissionConfig {
        assembly_type: AssemblyType::Covid19Outbreak,
        ..SubmissionConfig::default()
    };
    let genome = "ACGT".repeat(8_001);
    let result = Submission::new(config)
        .with_file(fixture(&dir, "virus.fa", &format!(">virus\n{genome}\n")), FileType::Fasta)
        .run(&SubmissionOptions::default());
    assert!(matches!(
        result,
        Err(SubmissionError::GenomeSizeExceeded {
            size: 32_004,
            ceiling: 32_000,
            assembly_type: AssemblyType::Covid19Outbreak,
        })
    ));
}

/// A persistent index keeps components for a later pass and bounds their ranges
#[test]
fn test_index_resumes_across_runs() {
    let dir = TempDir::new().unwrap();
    let config = SubmissionConfig {
        index_path: Some(dir.path().join("submission.db")),
        ..SubmissionConfig::default()
    };
    let assemble = SubmissionOptions {
        assemble: true,
        fasta_output: None,
    };

    Submission::new(config.clone())
        .with_file(fixture(&dir, "contigs.fa", CONTIGS), FileType::Fasta)
        .run(&assemble)
        .unwrap();

    let outcome = Submission::new(config.clone())
        .with_file(fixture(&dir, "scaffolds.agp", SCAFFOLDS), FileType::Agp)
        .run(&assemble)
        .unwrap();
    assert!(outcome.complete);
    assert!(outcome.sequences.iter().any(|s| s.name == "scaf1" && s.length == 18));

    let outcome = Submission::new(config)
        .with_file(
            fixture(&dir, "long.agp", "scaf9\t1\t12\t1\tW\tctg3\t1\t12\t+\n"),
            FileType::Agp,
        )
        .run(&assemble)
        .unwrap();
    assert_eq!(outcome.report.count_code(codes::AGP_COMPONENT_RANGE), 1);
    assert!(!outcome.complete);
}
