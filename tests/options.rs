mod common;

use std::sync::Arc;

use sheetmap::merge::merge_map_profiles;
use sheetmap::{
    ColumnMapProfile, FnConverter, OptionsBuilder, ReadOptions, RecordDescriptor, SheetError,
    SheetHandleOptions, Value, WriteOptions, property,
};

use common::{Badge, Employee};

#[test]
fn profile_names_and_columns_are_unique() {
    let mut options = ReadOptions::new();
    options.add_column("name", "姓名").unwrap();
    assert!(matches!(
        options.add_column("name", "Name"),
        Err(SheetError::DuplicateName(_))
    ));
    assert!(matches!(
        options.add_column("alias", "姓名"),
        Err(SheetError::DuplicateName(_))
    ));
    assert_eq!(options.mapping().len(), 1);
}

#[test]
fn blank_profile_arguments_are_missing() {
    let mut options = WriteOptions::new();
    assert!(matches!(
        options.add_column("", "Name"),
        Err(SheetError::ArgumentMissing("name"))
    ));
    assert!(matches!(
        options.add_column("name", " "),
        Err(SheetError::ArgumentMissing("column_name"))
    ));
}

#[test]
fn lookups_follow_the_direction() {
    let mut read = ReadOptions::new();
    read.add_column("gender", "性别").unwrap();
    assert!(read.get_map_profile("性别").is_some());
    assert!(read.get_map_profile("gender").is_none());

    let mut write = WriteOptions::new();
    write.add_column("gender", "性别").unwrap();
    assert!(write.get_map_profile("gender").is_some());
    assert!(write.get_map_profile("性别").is_none());
}

#[test]
fn ignore_property_records_the_directional_name() {
    let mut read = ReadOptions::new();
    read.ignore_property("notes", "备注");
    assert!(read.is_ignored("备注"));
    assert!(!read.is_ignored("notes"));

    let mut write = WriteOptions::new();
    write.ignore_property("notes", "备注");
    assert!(write.is_ignored("NOTES"));
    assert!(!write.is_ignored("备注"));
}

#[test]
fn function_converters_bind_to_the_options_direction() {
    let mut read = ReadOptions::new();
    read.add_function("flag", "Flag", |value| {
        Ok(Value::Boolean(value.as_display() == "Y"))
    })
    .unwrap();
    let profile = read.get_map_profile("Flag").unwrap();
    assert_eq!(
        profile.convert_cell_value(Value::from("Y")).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        profile.convert_item_value(Value::from("Y")).unwrap(),
        Value::from("Y")
    );

    let mut write = WriteOptions::new();
    write
        .add_function("flag", "Flag", |value| {
            Ok(Value::from(if value == Value::Boolean(true) { "Y" } else { "N" }))
        })
        .unwrap();
    let profile = write.get_map_profile("flag").unwrap();
    assert_eq!(
        profile.convert_item_value(Value::Boolean(true)).unwrap(),
        Value::from("Y")
    );
    assert_eq!(
        profile.convert_cell_value(Value::Boolean(true)).unwrap(),
        Value::Boolean(true)
    );
}

fn upper(value: Value) -> anyhow::Result<Value> {
    Ok(Value::from(value.as_display().to_uppercase()))
}

fn lower(value: Value) -> anyhow::Result<Value> {
    Ok(Value::from(value.as_display().to_lowercase()))
}

#[test]
fn converter_instances_run_both_ways() {
    let converter = Arc::new(FnConverter::new(
        Some(Arc::new(upper)),
        Some(Arc::new(lower)),
    ));
    let profile = ColumnMapProfile::with_converter("code", "Code", converter).unwrap();
    assert_eq!(
        profile.convert_cell_value(Value::from("ab")).unwrap(),
        Value::from("AB")
    );
    assert_eq!(
        profile.convert_item_value(Value::from("AB")).unwrap(),
        Value::from("ab")
    );
}

#[test]
fn builder_registers_configured_properties() {
    let options = common::chinese_read_options();
    assert_eq!(options.mapping().len(), 3);
    let gender = options.get_map_profile("性别").unwrap();
    assert_eq!(gender.name(), "gender");
    assert_eq!(
        gender.convert_cell_value(Value::from("女")).unwrap(),
        Value::Integer(2)
    );
}

#[test]
fn builder_ignore_and_order() {
    let options = OptionsBuilder::<WriteOptions, Employee>::new()
        .configure_profile(|profile| {
            profile.property(property!(Employee, age))?.ignore();
            profile.property(property!(Employee, name))?.has_order(5);
            Ok(())
        })
        .unwrap()
        .build();
    assert!(options.is_ignored("age"));
    assert_eq!(options.get_map_profile("name").unwrap().order(), 5);
}

#[test]
fn builder_rejects_a_blank_column_name() {
    let result = OptionsBuilder::<ReadOptions, Employee>::new().configure_profile(|profile| {
        profile.property(property!(Employee, name))?.has_column_name("  ")?;
        Ok(())
    });
    assert!(matches!(result, Err(SheetError::ArgumentMissing("column_name"))));
}

#[test]
fn builder_rejects_a_second_converter() {
    let result = OptionsBuilder::<ReadOptions, Employee>::new().configure_profile(|profile| {
        profile
            .property(property!(Employee, gender))?
            .has_converter(Ok)?
            .has_converter(Ok)?;
        Ok(())
    });
    assert!(matches!(result, Err(SheetError::InvalidConfiguration(_))));
}

#[test]
fn builder_pairs_cell_and_item_converters() {
    let options = OptionsBuilder::<WriteOptions, Employee>::new()
        .configure_profile(|profile| {
            profile
                .property(property!(Employee, gender))?
                .has_cell_converter(|cell| Ok(if cell.as_display() == "男" { 1 } else { 2 }))?
                .has_item_converter(|gender: &i32| {
                    Ok(Value::from(if *gender == 1 { "男" } else { "女" }))
                })?;
            Ok(())
        })
        .unwrap()
        .build();
    let profile = options.get_map_profile("gender").unwrap();
    assert_eq!(
        profile.convert_item_value(Value::Integer(2)).unwrap(),
        Value::from("女")
    );
    assert_eq!(
        profile.convert_cell_value(Value::from("男")).unwrap(),
        Value::Integer(1)
    );
}

#[derive(Debug, Default)]
struct Nested {
    inner: Employee,
}

impl sheetmap::SheetRecord for Nested {
    fn describe(record: &mut RecordDescriptor<Self>) {
        record.field("inner_name", |n| &n.inner.name, |n| &mut n.inner.name);
    }
}

#[test]
fn builder_rejects_nested_member_paths() {
    let result = OptionsBuilder::<ReadOptions, Nested>::new().configure_profile(|profile| {
        profile.property(property!(Nested, inner.name))?;
        Ok(())
    });
    assert!(matches!(result, Err(SheetError::InvalidExpression(_))));
}

#[test]
fn declared_profiles_merge_below_explicit_ones() {
    let mut options = ReadOptions::new();
    options.add_column("holder", "Owner").unwrap();
    merge_map_profiles(&mut options, &RecordDescriptor::<Badge>::of()).unwrap();

    assert_eq!(options.get_map_profile("Owner").unwrap().name(), "holder");
    assert!(options.get_map_profile("Holder").is_none());
    assert_eq!(options.get_map_profile("Badge Code").unwrap().order(), 2);
    assert!(options.is_ignored("notes"));
}

#[test]
fn declared_column_already_taken_is_skipped() {
    let mut options = WriteOptions::new();
    options.add_column("other", "Holder").unwrap();
    merge_map_profiles(&mut options, &RecordDescriptor::<Badge>::of()).unwrap();
    assert!(options.get_map_profile("holder").is_none());
    assert!(options.get_map_profile("code").is_some());
}

#[derive(Debug, Default)]
struct Clashing {
    first: String,
    second: String,
}

impl sheetmap::SheetRecord for Clashing {
    fn describe(record: &mut RecordDescriptor<Self>) {
        record
            .field("first", |c| &c.first, |c| &mut c.first)
            .column(sheetmap::ColumnMapAttribute::new("Same"));
        record
            .field("second", |c| &c.second, |c| &mut c.second)
            .column(sheetmap::ColumnMapAttribute::new("Same"));
    }
}

#[test]
fn duplicate_declared_columns_list_every_field() {
    let mut options = ReadOptions::new();
    let err = merge_map_profiles(&mut options, &RecordDescriptor::<Clashing>::of()).unwrap_err();
    match err {
        SheetError::DuplicateName(message) => {
            assert!(message.contains("first"));
            assert!(message.contains("second"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(options.mapping().is_empty());
}
