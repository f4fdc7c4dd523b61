use std::fs;
use std::io::Read;
use std::path::Path;

use stratus_export::io::excel_read;
use stratus_export::model::{CellValue, ExportJob, Record, Table};
use stratus_export::naming::build_filename;
use stratus_export::{ExportOutcome, Exporter, ToolError};
use tempfile::tempdir;

fn instances() -> Table {
    Table::from_records(vec![
        Record::new()
            .with("InstanceId", "i-0abc")
            .with("State", "running")
            .with("vCPUs", 2i64),
        Record::new()
            .with("InstanceId", "i-0def")
            .with("Platform", "windows")
            .with("State", CellValue::Null),
    ])
}

fn volumes() -> Table {
    Table::from_records(vec![
        Record::new().with("VolumeId", "vol-1").with("SizeGiB", 100i64).with("Encrypted", true),
    ])
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("CSV opened");
    reader
        .records()
        .map(|record| {
            record
                .expect("CSV record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

// Column widths as stored in a worksheet's `<cols>` block, one per column.
// The format stores the character width plus a fractional pixel padding.
fn stored_column_widths(workbook: &Path, sheet_number: usize) -> Vec<f64> {
    let file = fs::File::open(workbook).expect("workbook opened");
    let mut archive = zip::ZipArchive::new(file).expect("workbook is a zip archive");
    let mut xml = String::new();
    archive
        .by_name(&format!("xl/worksheets/sheet{sheet_number}.xml"))
        .expect("worksheet part")
        .read_to_string(&mut xml)
        .expect("worksheet xml");

    let attribute = |element: &str, name: &str| -> String {
        let key = format!(" {name}=\"");
        let start = element.find(&key).expect("attribute present") + key.len();
        let len = element[start..].find('"').expect("attribute closed");
        element[start..start + len].to_string()
    };

    let mut widths = Vec::new();
    for element in xml.split("<col ").skip(1) {
        let element = &element[..element.find("/>").expect("col element closed")];
        let min: usize = attribute(element, "min").parse().expect("numeric min");
        let max: usize = attribute(element, "max").parse().expect("numeric max");
        let width: f64 = attribute(element, "width").parse().expect("numeric width");
        widths.extend(std::iter::repeat_n(width, max - min + 1));
    }
    widths
}

#[test]
fn single_export_writes_header_union_and_rows() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path().join("output"));
    let filename = build_filename("ACME", "ec2", "", Some("03.04.2025"));

    let outcome = exporter.export_single(&instances(), &filename, "EC2 Instances");
    let path = match outcome {
        ExportOutcome::Spreadsheet(path) => path,
        other => panic!("expected spreadsheet export, got {other:?}"),
    };
    assert!(path.is_absolute());
    assert!(path.ends_with("ACME-ec2-export-03.04.2025.xlsx"));

    let sheets = excel_read::read_sheets(&path).expect("Excel read");
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "EC2 Instances");
    assert_eq!(sheets[0].header, vec!["InstanceId", "State", "vCPUs", "Platform"]);
    assert_eq!(sheets[0].row_count(), 2);
    assert_eq!(sheets[0].rows[0], vec!["i-0abc", "running", "2", "N/A"]);
    assert_eq!(sheets[0].rows[1], vec!["i-0def", "N/A", "N/A", "windows"]);
}

#[test]
fn multi_export_keeps_sheet_order() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    let job = ExportJob::new("ACME-compute-export-03.04.2025.xlsx")
        .with_sheet("Volumes", volumes())
        .with_sheet("Instances", instances())
        .with_sheet("This/Name*Is?Too<Long-And-Has-Bad-Chars", Table::new());

    let outcome = exporter.export_job(&job);
    assert!(outcome.is_written());
    assert!(!outcome.is_fallback());

    let paths = outcome.paths();
    let sheets = excel_read::read_sheets(paths[0]).expect("Excel read");
    let names: Vec<&str> = sheets.iter().map(|sheet| sheet.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Volumes", "Instances", "ThisNameIsToo<Long-And-Has-Bad-"]
    );
    assert_eq!(sheets[0].header, vec!["VolumeId", "SizeGiB", "Encrypted"]);
    assert_eq!(sheets[0].rows[0], vec!["vol-1", "100", "true"]);
    assert_eq!(sheets[1].row_count(), 2);
    assert_eq!(sheets[2].row_count(), 0);
}

#[test]
fn output_directory_is_created() {
    let temp_dir = tempdir().expect("temporary directory");
    let output_dir = temp_dir.path().join("a").join("b");
    let exporter = Exporter::new(&output_dir);

    let outcome = exporter.export_single(&volumes(), "volumes.xlsx", "Volumes");
    assert!(matches!(outcome, ExportOutcome::Spreadsheet(_)));
    assert!(output_dir.join("volumes.xlsx").is_file());
}

#[test]
fn repeated_export_overwrites() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());

    let first = exporter
        .export_single(&instances(), "instances.xlsx", "Instances")
        .into_result()
        .expect("first export");
    let first_contents = excel_read::read_sheets(&first[0]).expect("Excel read");

    let second = exporter
        .export_single(&instances(), "instances.xlsx", "Instances")
        .into_result()
        .expect("second export");
    let second_contents = excel_read::read_sheets(&second[0]).expect("Excel read");

    assert_eq!(first, second);
    assert_eq!(first_contents, second_contents);
    let entries = fs::read_dir(temp_dir.path()).expect("directory listed").count();
    assert_eq!(entries, 1);
}

#[test]
fn spreadsheet_failure_falls_back_to_csv() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    // A directory in place of the workbook makes the save fail.
    fs::create_dir(temp_dir.path().join("instances.xlsx")).expect("blocking directory");

    let outcome = exporter.export_single(&instances(), "instances.xlsx", "Instances");
    let paths = match outcome {
        ExportOutcome::Fallback { paths, .. } => paths,
        other => panic!("expected CSV fallback, got {other:?}"),
    };
    assert_eq!(paths, vec![temp_dir.path().join("instances.csv")]);

    let rows = read_csv(&paths[0]);
    assert_eq!(
        rows,
        vec![
            vec!["InstanceId", "State", "vCPUs", "Platform"],
            vec!["i-0abc", "running", "2", "N/A"],
            vec!["i-0def", "N/A", "N/A", "windows"],
        ]
    );
}

#[test]
fn multi_sheet_failure_writes_one_csv_per_sheet() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    fs::create_dir(temp_dir.path().join("compute.xlsx")).expect("blocking directory");

    let sheets = vec![
        ("Instances".to_string(), instances()),
        ("Volumes".to_string(), volumes()),
    ];
    let outcome = exporter.export_multi(&sheets, "compute.xlsx");
    assert!(outcome.is_fallback());

    let paths: Vec<_> = outcome.paths().into_iter().map(Path::to_path_buf).collect();
    assert_eq!(
        paths,
        vec![
            temp_dir.path().join("compute-Instances.csv"),
            temp_dir.path().join("compute-Volumes.csv"),
        ]
    );
    assert_eq!(read_csv(&paths[1])[1], vec!["vol-1", "100", "true"]);
}

#[test]
fn total_failure_is_reported_not_raised() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    fs::create_dir(temp_dir.path().join("instances.xlsx")).expect("blocking directory");
    fs::create_dir(temp_dir.path().join("instances.csv")).expect("blocking directory");

    let outcome = exporter.export_single(&instances(), "instances.xlsx", "Instances");
    assert!(matches!(outcome, ExportOutcome::Failed { .. }));
    assert!(outcome.paths().is_empty());
    assert!(outcome.into_result().is_err());
}

#[test]
fn multi_sheet_fallback_keeps_colliding_sheet_names_apart() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    fs::create_dir(temp_dir.path().join("net.xlsx")).expect("blocking directory");

    let sheets = vec![
        (
            "Security Groups".to_string(),
            Table::from_records(vec![Record::new().with("GroupId", "sg-1")]),
        ),
        (
            "Security_Groups".to_string(),
            Table::from_records(vec![Record::new().with("RuleId", "sgr-1")]),
        ),
    ];
    let outcome = exporter.export_multi(&sheets, "net.xlsx");
    assert!(outcome.is_fallback());

    let paths: Vec<_> = outcome.paths().into_iter().map(Path::to_path_buf).collect();
    assert_eq!(
        paths,
        vec![
            temp_dir.path().join("net-Security_Groups.csv"),
            temp_dir.path().join("net-Security_Groups_1.csv"),
        ]
    );
    assert_eq!(read_csv(&paths[0]), vec![vec!["GroupId"], vec!["sg-1"]]);
    assert_eq!(read_csv(&paths[1]), vec![vec!["RuleId"], vec!["sgr-1"]]);
}

#[test]
fn column_widths_follow_content_per_sheet() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    let subnets = Table::from_records(vec![
        Record::new()
            .with("AvailabilityZone", "a")
            .with("Description", "d".repeat(60))
            .with("id", "vol-0123"),
    ]);
    let sheets = vec![
        ("Subnets".to_string(), subnets),
        ("Volumes".to_string(), volumes()),
    ];

    let paths = exporter
        .export_multi(&sheets, "widths.xlsx")
        .into_result()
        .expect("workbook written");

    let floor = |widths: Vec<f64>| -> Vec<usize> {
        widths.into_iter().map(|width| width.floor() as usize).collect()
    };
    // Header dominates, capped cell, cell dominates.
    assert_eq!(floor(stored_column_widths(&paths[0], 1)), vec![18, 50, 10]);
    assert_eq!(floor(stored_column_widths(&paths[0], 2)), vec![10, 9, 11]);
}

#[test]
fn integers_beyond_exact_range_keep_every_digit() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());
    let table = Table::from_records(vec![
        Record::new()
            .with("Exact", 9_007_199_254_740_992i64)
            .with("Large", 9_007_199_254_740_993i64)
            .with("Negative", -9_007_199_254_740_993i64),
    ]);

    let paths = exporter
        .export_single(&table, "ids.xlsx", "Ids")
        .into_result()
        .expect("workbook written");

    let sheets = excel_read::read_sheets(&paths[0]).expect("Excel read");
    assert_eq!(
        sheets[0].rows[0],
        vec!["9007199254740992", "9007199254740993", "-9007199254740993"]
    );
}

#[test]
fn empty_sheet_list_writes_nothing() {
    let temp_dir = tempdir().expect("temporary directory");
    let exporter = Exporter::new(temp_dir.path());

    let outcome = exporter.export_job(&ExportJob::new("empty.xlsx"));
    assert!(matches!(
        outcome,
        ExportOutcome::Failed {
            spreadsheet: ToolError::EmptyExport(_),
            ..
        }
    ));
    assert!(!temp_dir.path().join("empty.xlsx").exists());
    assert!(outcome.into_result().is_err());
}
