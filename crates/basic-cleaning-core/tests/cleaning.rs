use std::fs;
use std::path::{Path, PathBuf};

use basic_cleaning_core::dataset::{load_dataset, read_header, write_dataset};
use basic_cleaning_core::{clean_dataset, CleaningError, PriceRange};
use tempfile::tempdir;

const LISTINGS: &str = "\
id,name,host_id,price,minimum_nights,last_review,reviews_per_month
2539,\"Clean & quiet apt, home by the park\",00787,149,1,2018-10-19,0.21
2595,Skylit Midtown Castle,2845,225,1,05/21/2019,0.38
3647,THE VILLAGE OF HARLEM,4632,150,3,,
3831,Cozy Entire Floor,4869,89.50,1,2019-07-05 00:00:00,4.64
5022,Entire Apt: Spacious Studio,7192,80,10,November 19 2018,0.10
5099,Large Cozy 1 BR,7322,200,3,2019-06-22,0.59
5121,BlissArtsSpace!,7356,60,45,2017-10-05,0.40
5178,Large Furnished Room,8967,79,2,2019-06-24,3.47
5203,Cozy Clean Guest Room,7490,79,2,2017-07-21,0.99
5238,Cute & Cozy Lower East Side,7549,n/a,1,2019-06-09,1.33
5295,Beautiful 1br on Upper West,7702,135,5,2019-06-22,0.43
5441,Central Manhattan/near Broadway,7989,85,2,2019-06-23,1.50
5803,\"Lovely Room 1, Garden, Best Area\",9744,89,4,2019-06-24,1.34
6021,Wonderful Guest Bedroom in Manhattan,11528,0,2,2019-07-05,0.91
6090,West Village Nest - Superhost,11975,12000,90,2018-10-31,0.22
";

fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture csv");
    path
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("open csv");
    let header = reader
        .headers()
        .expect("header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| record.expect("record").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn clean_to_file(input: &str, range: PriceRange) -> (Vec<String>, Vec<Vec<String>>) {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", input);
    let df = load_dataset(&path).unwrap();
    let (mut cleaned, _) = clean_dataset(&df, &range).unwrap();
    let out = dir.path().join("clean_sample.csv");
    write_dataset(&mut cleaned, &out).unwrap();
    read_rows(&out)
}

#[test]
fn keeps_only_rows_inside_the_inclusive_range() {
    let (_, rows) = clean_to_file(LISTINGS, PriceRange::new(10.0, 350.0).unwrap());

    let ids: Vec<&str> = rows.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "2539", "2595", "3647", "3831", "5022", "5099", "5121", "5178", "5203", "5295",
            "5441", "5803"
        ]
    );
    for row in &rows {
        let price: f64 = row[3].parse().unwrap();
        assert!((10.0..=350.0).contains(&price));
    }
}

#[test]
fn scenario_only_mid_price_row_survives() {
    let input = "id,price,last_review\na,0,2019-01-01\nb,50,2019-01-02\nc,10000,2019-01-03\n";
    let (header, rows) = clean_to_file(input, PriceRange::new(10.0, 1000.0).unwrap());

    assert_eq!(header, vec!["id", "price", "last_review"]);
    assert_eq!(rows, vec![vec!["b", "50", "2019-01-02"]]);
}

#[test]
fn untouched_columns_are_carried_through_verbatim() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", LISTINGS);
    let (_, input_rows) = read_rows(&path);

    let (header, output_rows) = clean_to_file(LISTINGS, PriceRange::new(10.0, 350.0).unwrap());
    let review_idx = header.iter().position(|name| name == "last_review").unwrap();

    for output in &output_rows {
        let input = input_rows
            .iter()
            .find(|row| row[0] == output[0])
            .expect("output row must come from input");
        for (idx, (before, after)) in input.iter().zip(output).enumerate() {
            if idx != review_idx {
                assert_eq!(before, after, "column {} changed", header[idx]);
            }
        }
    }
}

#[test]
fn last_review_is_canonical_or_empty() {
    let (header, rows) = clean_to_file(LISTINGS, PriceRange::new(10.0, 350.0).unwrap());
    let review_idx = header.iter().position(|name| name == "last_review").unwrap();

    let by_id = |id: &str| {
        rows.iter()
            .find(|row| row[0] == id)
            .map(|row| row[review_idx].clone())
            .unwrap()
    };

    assert_eq!(by_id("2539"), "2018-10-19");
    assert_eq!(by_id("2595"), "2019-05-21");
    assert_eq!(by_id("3647"), "");
    assert_eq!(by_id("3831"), "2019-07-05");
    // "November 19 2018" lacks the comma the month-name layout expects.
    assert_eq!(by_id("5022"), "");
}

#[test]
fn invalid_prices_are_dropped_not_fatal() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", LISTINGS);
    let df = load_dataset(&path).unwrap();

    let (cleaned, stats) = clean_dataset(&df, &PriceRange::new(0.0, 100_000.0).unwrap()).unwrap();

    assert_eq!(stats.input_rows, 15);
    assert_eq!(stats.price.missing_or_invalid, 1);
    assert_eq!(stats.price.out_of_range, 0);
    assert_eq!(cleaned.height(), 14);
    assert_eq!(stats.output_rows, 14);
    assert_eq!(stats.columns, 7);
}

#[test]
fn full_range_keeps_every_valid_row() {
    let input = "id,price,last_review\na,1,\nb,2,\nc,3,\n";
    let (_, rows) = clean_to_file(input, PriceRange::new(f64::NEG_INFINITY, f64::INFINITY).unwrap());
    assert_eq!(rows.len(), 3);
}

#[test]
fn cleaning_is_deterministic() {
    let first = clean_to_file(LISTINGS, PriceRange::new(10.0, 350.0).unwrap());
    let second = clean_to_file(LISTINGS, PriceRange::new(10.0, 350.0).unwrap());
    assert_eq!(first, second);
}

#[test]
fn missing_price_column_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", "id,cost,last_review\na,10,2019-01-01\n");

    let err = load_dataset(&path).unwrap_err();
    match err {
        CleaningError::Format(message) => assert!(message.contains("price")),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn missing_last_review_column_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", "id,price\na,10\n");

    assert!(matches!(read_header(&path), Err(CleaningError::Format(_))));
}

#[test]
fn empty_file_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", "");

    assert!(matches!(load_dataset(&path), Err(CleaningError::Format(_))));
}

#[test]
fn duplicate_columns_are_a_format_error() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", "price,price,last_review\n1,2,\n");

    assert!(matches!(read_header(&path), Err(CleaningError::Format(_))));
}

#[test]
fn row_with_extra_fields_is_a_format_error() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "sample.csv",
        "id,price,last_review\na,10,2019-01-01,extra\n",
    );

    assert!(matches!(load_dataset(&path), Err(CleaningError::Format(_))));
}

#[test]
fn writing_into_a_missing_directory_is_an_io_error() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "sample.csv", "id,price,last_review\na,10,2019-01-01\n");
    let mut df = load_dataset(&path).unwrap();

    let target = dir.path().join("missing").join("clean_sample.csv");
    assert!(matches!(
        write_dataset(&mut df, &target),
        Err(CleaningError::Io(_))
    ));
    assert!(!target.exists());
}
