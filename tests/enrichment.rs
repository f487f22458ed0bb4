use std::collections::HashMap;
use std::io::Write;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;

use kira_enrichment::domain::{PlotStatistic, TermStat};
use kira_enrichment::enrichment::{EnrichmentTable, PlotSelection};
use kira_enrichment::error::{EnrichmentError, KiraError};

const HEADER: &str = "ONTOLOGY,ID,Description,GeneRatio,BgRatio,pvalue,p.adjust,qvalue,geneID,Count";
const STEROL: &str = "GO,GO:0016126,sterol biosynthetic process,20/1383,52/23210,5e-12,3e-08,8e-10,Cyb5r1/Hsd17b7/Ebp,20";

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from("tests/fixtures").join(name)
}

#[test]
fn reads_fixture_in_file_order() {
    let table = EnrichmentTable::read(&fixture("ora_liver.csv"), "liver", None).unwrap();
    assert_eq!(
        table.terms,
        vec!["GO:0016126", "GO:0006695", "GO:0008610", "GO:0016491"]
    );
    assert_eq!(table.term_types.len(), 4);
    assert_eq!(table.definitions.len(), 4);
    assert_eq!(table.genes.len(), 4);
    assert_eq!(table.term_types["GO:0016491"], "MF");
    assert_eq!(table.genes["GO:0006695"].len(), 4);
    assert!(table.plot.is_empty());
}

#[test]
fn description_with_commas_is_rebuilt() {
    let table = EnrichmentTable::read(&fixture("ora_liver.csv"), "liver", None).unwrap();
    assert_eq!(
        table.definitions["GO:0008610"],
        "lipid biosynthetic process, including sterols, and fatty acids"
    );
    assert!(table.genes["GO:0008610"].contains("Acaca"));
}

#[test]
fn sterol_row_plot_statistic() {
    let text = format!("{HEADER}\n{STEROL}\n");
    let stats = HashMap::from([("GO:0016126".to_string(), TermStat { rank: 1, count: 1 })]);
    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: Some(&stats),
    };
    let table = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap();
    assert_eq!(
        table.plot["GO:0016126"],
        PlotStatistic {
            gene_ratio: 0.014,
            neg_log10_padj: 7.5,
            count: 20,
            gene_ratio_raw: "20/1383".to_string(),
            background_ratio_raw: "52/23210".to_string(),
        }
    );
    let genes = table.genes["GO:0016126"].iter().cloned().collect::<Vec<_>>();
    assert_eq!(genes, vec!["Cyb5r1", "Ebp", "Hsd17b7"]);
}

#[test]
fn rows_outside_rank_limits_get_no_plot_data() {
    let text = format!("{HEADER}\n{STEROL}\nGO,GO:2,other,1/10,2/100,0.1,0.2,0.3,A/B,2\n");
    let stats = HashMap::from([
        ("GO:0016126".to_string(), TermStat { rank: 1, count: 1 }),
        ("GO:2".to_string(), TermStat { rank: 11, count: 1 }),
    ]);
    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: Some(&stats),
    };
    let table = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap();
    assert_eq!(table.terms.len(), 2);
    assert!(table.plot.contains_key("GO:0016126"));
    assert!(!table.plot.contains_key("GO:2"));
    assert!(table.genes.contains_key("GO:2"));
}

#[test]
fn rows_over_count_limit_get_no_plot_data() {
    let text = format!("{HEADER}\n{STEROL}\nGO,GO:2,other,1/10,2/100,0.1,0.2,0.3,A/B,2\n");
    let stats = HashMap::from([
        ("GO:0016126".to_string(), TermStat { rank: 1, count: 1 }),
        ("GO:2".to_string(), TermStat { rank: 2, count: 11 }),
    ]);
    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: Some(&stats),
    };
    let table = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap();
    assert!(table.plot.contains_key("GO:0016126"));
    assert!(!table.plot.contains_key("GO:2"));
    assert_eq!(table.genes["GO:2"].len(), 2);
}

#[test]
fn quoted_row_loses_its_quotes() {
    let text = format!(
        "{HEADER}\n\"GO\",\"GO:1\",\"lipid, sterol\",\"1/2\",\"1/4\",\"0.1\",\"0.01\",\"0.3\",\"A/B\",\"2\"\n"
    );
    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: None,
    };
    let table = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap();
    assert_eq!(table.terms, vec!["GO:1"]);
    assert_eq!(table.term_types["GO:1"], "GO");
    assert_eq!(table.definitions["GO:1"], "lipid, sterol");
    let genes = table.genes["GO:1"].iter().cloned().collect::<Vec<_>>();
    assert_eq!(genes, vec!["A", "B"]);
    assert_eq!(table.plot["GO:1"].gene_ratio_raw, "1/2");
    assert_eq!(table.plot["GO:1"].neg_log10_padj, 2.0);
}

#[test]
fn short_second_row_rejects_whole_file() {
    let text = format!("{HEADER}\n{STEROL}\nGO,GO:2,other,1/10,2/100,0.1,0.2,0.3,A/B\n");
    let err = EnrichmentTable::parse(&text, "exp1", None).unwrap_err();
    assert_eq!(err.status(), 1);
    assert_matches!(
        err,
        EnrichmentError::MalformedRow {
            line: 3,
            expected: 10,
            found: 9,
            ..
        }
    );
}

#[test]
fn duplicate_term_names_experiment() {
    let text = format!("{HEADER}\n{STEROL}\n{STEROL}\n");
    let err = EnrichmentTable::parse(&text, "exp7", None).unwrap_err();
    assert_eq!(err.status(), 2);
    assert!(err.message().contains("exp7"));
    assert!(err.message().contains("GO:0016126"));
}

#[test]
fn malformed_row_outranks_duplicate() {
    let text = format!("{HEADER}\n{STEROL}\n{STEROL}\nGO,GO:3,short\n");
    let err = EnrichmentTable::parse(&text, "exp1", None).unwrap_err();
    assert_eq!(err.status(), 1);
}

#[test]
fn malformed_ratio_only_matters_for_plot_data() {
    let text = format!("{HEADER}\nGO,GO:1,desc,twenty/1383,52/23210,5e-12,3e-08,8e-10,A/B,2\n");
    assert!(EnrichmentTable::parse(&text, "exp1", None).is_ok());

    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: None,
    };
    let err = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap_err();
    assert_eq!(err.status(), 3);
    assert_matches!(
        err,
        EnrichmentError::MalformedPlotData {
            field: "gene ratio",
            ..
        }
    );
}

#[test]
fn malformed_padj_and_background_ratio() {
    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: None,
    };
    let text = format!("{HEADER}\nGO,GO:1,desc,1/2,52,5e-12,3e-08,8e-10,A/B,2\n");
    let err = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap_err();
    assert_matches!(
        err,
        EnrichmentError::MalformedPlotData {
            field: "background ratio",
            ..
        }
    );

    let text = format!("{HEADER}\nGO,GO:1,desc,1/2,5/52,5e-12,NA,8e-10,A/B,2\n");
    let err = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap_err();
    assert_matches!(
        err,
        EnrichmentError::MalformedPlotData {
            field: "adjusted p-value",
            ..
        }
    );
}

#[test]
fn non_positive_padj_is_malformed_plot_data() {
    let selection = PlotSelection {
        gene_ratio_limit: 10,
        padj_limit: 10,
        term_stats: None,
    };
    for padj in ["0", "-0.01", "inf", "NaN"] {
        let text = format!("{HEADER}\nGO,GO:1,desc,1/2,5/52,5e-12,{padj},8e-10,A/B,2\n");
        let err = EnrichmentTable::parse(&text, "exp1", Some(&selection)).unwrap_err();
        assert_eq!(err.status(), 3);
        assert_matches!(
            err,
            EnrichmentError::MalformedPlotData {
                line: 2,
                field: "adjusted p-value",
                ..
            }
        );
    }
}

#[test]
fn header_only_and_empty_are_distinct() {
    let err = EnrichmentTable::parse(&format!("{HEADER}\n"), "exp1", None).unwrap_err();
    assert_eq!(err.status(), 4);
    let err = EnrichmentTable::parse("", "exp1", None).unwrap_err();
    assert_eq!(err.status(), 5);
}

#[test]
fn parsing_twice_is_identical() {
    let first = EnrichmentTable::read(&fixture("ora_kidney.csv"), "kidney", None).unwrap();
    let second = EnrichmentTable::read(&fixture("ora_kidney.csv"), "kidney", None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn gzip_input_matches_plain() {
    let plain_path = fixture("ora_liver.csv");
    let content = std::fs::read(plain_path.as_std_path()).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let gz_path = Utf8PathBuf::from_path_buf(temp.path().join("ora_liver.csv.gz")).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&content).unwrap();
    std::fs::write(gz_path.as_std_path(), encoder.finish().unwrap()).unwrap();

    let plain = EnrichmentTable::read(&plain_path, "liver", None).unwrap();
    let gz = EnrichmentTable::read(&gz_path, "liver", None).unwrap();
    assert_eq!(plain, gz);
}

#[test]
fn missing_file_is_filesystem_error() {
    let err = EnrichmentTable::read(Utf8Path::new("tests/fixtures/nope.csv"), "x", None)
        .unwrap_err();
    assert_matches!(err, KiraError::Filesystem(_));
}

#[test]
fn rejection_surfaces_through_crate_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("empty.csv")).unwrap();
    std::fs::write(path.as_std_path(), "").unwrap();
    let err = EnrichmentTable::read(&path, "exp1", None).unwrap_err();
    assert_matches!(err, KiraError::Enrichment(EnrichmentError::Empty { .. }));
}
