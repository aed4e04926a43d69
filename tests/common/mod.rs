#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sheetmap::{
    ColumnMapAttribute, MemorySheet, MemoryWorkbook, OptionsBuilder, ReadOptions,
    RecordDescriptor, SheetRecord, Value, property,
};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        sheetmap::init_logging();
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Employee {
    pub name: String,
    pub gender: i32,
    pub age: Option<i32>,
}

impl Employee {
    pub fn new(name: &str, gender: i32, age: Option<i32>) -> Self {
        Self {
            name: name.to_string(),
            gender,
            age,
        }
    }
}

impl SheetRecord for Employee {
    fn describe(record: &mut RecordDescriptor<Self>) {
        record.field("name", |e| &e.name, |e| &mut e.name);
        record.field("gender", |e| &e.gender, |e| &mut e.gender);
        record.field("age", |e| &e.age, |e| &mut e.age);
    }
}

/// Record carrying declarative column metadata on its fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Badge {
    pub code: String,
    pub holder: String,
    pub level: i32,
    pub notes: String,
}

impl SheetRecord for Badge {
    fn describe(record: &mut RecordDescriptor<Self>) {
        record
            .field("code", |b| &b.code, |b| &mut b.code)
            .column(ColumnMapAttribute::new("Badge Code").order(2));
        record
            .field("holder", |b| &b.holder, |b| &mut b.holder)
            .column(ColumnMapAttribute::new("Holder").order(1));
        record.field("level", |b| &b.level, |b| &mut b.level);
        record
            .field("notes", |b| &b.notes, |b| &mut b.notes)
            .column(ColumnMapAttribute::ignored());
    }
}

pub fn row(cells: &[&str]) -> Vec<Value> {
    cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                Value::Empty
            } else {
                Value::from(*cell)
            }
        })
        .collect()
}

pub fn memory_workbook(sheets: Vec<(&str, Vec<Vec<Value>>)>) -> Vec<u8> {
    sheets
        .into_iter()
        .fold(MemoryWorkbook::new(), |workbook, (name, rows)| {
            workbook.with_sheet(MemorySheet::from_rows(name, rows))
        })
        .to_json()
        .expect("serialize workbook")
}

/// Chinese headers with a gender column spelled 男/女.
pub fn chinese_employees() -> Vec<u8> {
    memory_workbook(vec![(
        "Sheet1",
        vec![
            row(&["姓名", "性别", "年龄"]),
            row(&["张三", "男", "30"]),
            row(&["李四", "女", ""]),
            row(&["王五", "", "41"]),
        ],
    )])
}

pub fn chinese_read_options() -> ReadOptions {
    OptionsBuilder::<ReadOptions, Employee>::new()
        .configure_profile(|profile| {
            profile.property(property!(Employee, name))?.has_column_name("姓名")?;
            profile
                .property(property!(Employee, gender))?
                .has_column_name("性别")?
                .has_cell_converter(|cell| {
                    Ok(match cell.as_display().as_str() {
                        "男" => 1,
                        "女" => 2,
                        _ => 0,
                    })
                })?;
            profile.property(property!(Employee, age))?.has_column_name("年龄")?;
            Ok(())
        })
        .expect("configure profile")
        .build()
}
