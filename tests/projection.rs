mod common;

use sheetmap::backend::SheetSource;
use sheetmap::merge::apply_type_styles;
use sheetmap::projection::{
    plan_pages, project_rows, read_column_values, resolve_read_mapping, resolve_write_mapping,
    write_rows,
};
use sheetmap::{
    CancellationToken, CellStyle, FieldValue, FontAspect, MemoryBackend, MemorySheet,
    MemoryWorkbook, ReadOptions, RecordDescriptor, SectionStyles, SheetError, SheetHandleOptions,
    SheetRecord, SheetWrapper, TypeStyles, Value, WriteOptions,
};

use common::row;

fn offset_sheet() -> MemorySheet {
    MemorySheet::from_rows(
        "Report",
        vec![
            row(&["title", "", ""]),
            row(&["skip", "Code", "Qty"]),
            row(&["x", "A", "1"]),
            row(&["y", "B", "2"]),
        ],
    )
}

#[test]
fn header_row_and_first_column_shift_the_window() {
    let sheet = offset_sheet();
    let mut options = ReadOptions::new();
    options.header_row_number = 2;
    options.first_column_number = 2;

    let mapping = resolve_read_mapping(&sheet, &options).unwrap();
    assert_eq!(mapping.names().collect::<Vec<_>>(), vec!["Code", "Qty"]);
    assert!(mapping.get(1).is_none());

    let rows = project_rows(
        &sheet,
        &options,
        &mapping,
        Vec::new,
        |record: &mut Vec<(String, Value)>, profile, value| {
            record.push((profile.name().to_string(), value));
            Ok(())
        },
    )
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec![
        ("Code".to_string(), Value::from("B")),
        ("Qty".to_string(), Value::from("2")),
    ]);
}

#[test]
fn rows_with_data_left_of_the_window_are_not_blank() {
    let sheet = MemorySheet::from_rows(
        "S",
        vec![
            row(&["", "Code"]),
            row(&["note", ""]),
            row(&["", ""]),
            row(&["", "A"]),
        ],
    );
    let mut options = ReadOptions::new();
    options.first_column_number = 2;
    let mapping = resolve_read_mapping(&sheet, &options).unwrap();
    let rows = project_rows(
        &sheet,
        &options,
        &mapping,
        Vec::new,
        |record: &mut Vec<Value>, _, value| {
            record.push(value);
            Ok(())
        },
    )
    .unwrap();
    assert_eq!(rows, vec![vec![Value::Empty], vec![Value::from("A")]]);
}

#[test]
fn header_row_at_usize_max_is_rejected_without_overflow() {
    let sheet = MemorySheet::from_rows("S", vec![row(&["Code"]), row(&["A"])]);
    let mut options = ReadOptions::new();
    let mapping = resolve_read_mapping(&sheet, &options).unwrap();
    options.header_row_number = usize::MAX;
    let err = project_rows(&sheet, &options, &mapping, || (), |_, _, _| Ok(())).unwrap_err();
    assert!(matches!(err, SheetError::InvalidArgument(_)));

    let mut write_options = WriteOptions::new();
    write_options.first_column_number = usize::MAX;
    assert!(matches!(
        resolve_write_mapping(["a", "b"], &write_options),
        Err(SheetError::InvalidArgument(_))
    ));
    assert!(matches!(options.validate(), Err(SheetError::InvalidConfiguration(_))));
    assert!(matches!(write_options.validate(), Err(SheetError::InvalidConfiguration(_))));
}

#[test]
fn two_headers_mapping_to_one_name_are_rejected() {
    let sheet = MemorySheet::from_rows("S", vec![row(&["Qty", "Amount"])]);
    let mut options = ReadOptions::new();
    options.add_column("Amount", "Qty").unwrap();
    assert!(matches!(
        resolve_read_mapping(&sheet, &options),
        Err(SheetError::DuplicateName(_))
    ));
}

#[test]
fn ignored_headers_win_over_registered_profiles() {
    let sheet = MemorySheet::from_rows("S", vec![row(&["Name", "Age"]), row(&["Ann", "30"])]);
    let mut options = ReadOptions::new();
    options.add_column("years", "Age").unwrap();
    options.ignore_name(["age"]);
    let mapping = resolve_read_mapping(&sheet, &options).unwrap();
    assert_eq!(mapping.names().collect::<Vec<_>>(), vec!["Name"]);
}

#[test]
fn write_columns_sort_by_order_with_stable_ties() {
    let mut options = WriteOptions::new();
    options.first_column_number = 3;
    options
        .add_map_profile(sheetmap::ColumnMapProfile::new("c").unwrap().ordered(-1))
        .unwrap();
    let mapping = resolve_write_mapping(["a", "b", "c", "d"], &options).unwrap();
    let laid_out = mapping
        .iter()
        .map(|(column, profile)| (column, profile.name()))
        .collect::<Vec<_>>();
    assert_eq!(laid_out, vec![(3, "c"), (4, "a"), (5, "b"), (6, "d")]);
}

#[test]
fn two_fields_writing_one_column_are_rejected() {
    let mut options = WriteOptions::new();
    options.add_column("a", "b").unwrap();
    assert!(matches!(
        resolve_write_mapping(["a", "b"], &options),
        Err(SheetError::DuplicateName(_))
    ));
}

#[test]
fn rows_land_below_a_shifted_header() {
    let mut options = WriteOptions::new();
    options.header_row_number = 3;
    let mapping = resolve_write_mapping(["n"], &options).unwrap();
    let mut sheet = MemorySheet::new("Out");
    write_rows(&mut sheet, &options, &mapping, &[7i64, 8], |item, _| {
        Ok(item.to_value())
    })
    .unwrap();
    assert_eq!(sheet.cell_value(3, 1), Value::from("n"));
    assert_eq!(sheet.cell_value(4, 1), Value::Integer(7));
    assert_eq!(sheet.cell_value(5, 1), Value::Integer(8));
    assert_eq!(sheet.last_row(), 5);
}

#[test]
fn column_reads_report_failing_rows() {
    let sheet = MemorySheet::from_rows("S", vec![row(&["1"]), row(&["two"])]);
    let err = read_column_values(&sheet, 1, 1, i32::from_value).unwrap_err();
    assert!(matches!(err, SheetError::Conversion { row: 2, .. }));
}

#[test]
fn pages_without_size_keep_the_requested_name() {
    let pages = plan_pages("Employees", 10, None).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].name, "Employees");
    assert_eq!(pages[0].rows, 0..10);
}

#[derive(Debug, Default)]
struct Styled {
    label: String,
}

impl SheetRecord for Styled {
    fn describe(record: &mut RecordDescriptor<Self>) {
        record.field("label", |s| &s.label, |s| &mut s.label);
        let styles = record.styles_mut();
        styles.header.font = Some(FontAspect {
            bold: true,
            size: 14.0,
            ..FontAspect::default()
        });
        styles.body.style = Some(CellStyle {
            italic: true,
            ..CellStyle::default()
        });
    }
}

#[test]
fn explicit_styles_beat_type_declarations() {
    let styles = TypeStyles {
        header: SectionStyles {
            style: Some(CellStyle {
                font_size: 20.0,
                ..CellStyle::default()
            }),
            font: Some(FontAspect {
                size: 9.0,
                ..FontAspect::default()
            }),
            ..SectionStyles::default()
        },
        body: SectionStyles::default(),
    };
    let mut options = WriteOptions::new();
    apply_type_styles(&mut options, &styles);
    assert_eq!(options.header_style.as_ref().map(|s| s.font_size), Some(20.0));
    assert!(options.body_style.is_none());

    let explicit = CellStyle {
        bold: true,
        ..CellStyle::default()
    };
    let mut options = WriteOptions::new();
    options.header_style = Some(explicit.clone());
    apply_type_styles(&mut options, &styles);
    assert_eq!(options.header_style, Some(explicit));
}

#[tokio::test]
async fn declared_type_styles_reach_the_cells() {
    let token = CancellationToken::new();
    let bytes = SheetWrapper::new(MemoryBackend)
        .write_list(
            vec![Styled {
                label: "x".to_string(),
            }],
            None,
            "S",
            None,
            &token,
        )
        .await
        .unwrap();
    let workbook = MemoryWorkbook::from_json(&bytes).unwrap();
    let sheet = workbook.sheet("S").unwrap();

    let header = sheet.style_at(1, 1).unwrap();
    assert!(header.bold);
    assert_eq!(header.font_size, 14.0);
    let body = sheet.style_at(2, 1).unwrap();
    assert!(body.italic);
    assert!(!body.bold);
}
