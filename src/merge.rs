use itertools::Itertools;
use log::debug;

use crate::error::{Result, SheetError};
use crate::options::{SheetHandleOptions, WriteOptions};
use crate::profile::ColumnMapProfile;
use crate::record::RecordDescriptor;
use crate::style::TypeStyles;

/// Folds a record type's declarative column metadata into `options`.
///
/// Profiles already registered under a field's logical name are left alone,
/// and a declaration whose column is already claimed is skipped, so explicit
/// configuration always wins. Two declarations claiming the same column are
/// rejected before anything is registered.
pub fn merge_map_profiles<O, T>(options: &mut O, descriptor: &RecordDescriptor<T>) -> Result<()>
where
    O: SheetHandleOptions,
    T: 'static,
{
    let declared = descriptor
        .fields()
        .iter()
        .filter_map(|field| {
            field.attribute().map(|attribute| {
                let column = attribute.column_name().unwrap_or(field.name());
                (field.name(), column, attribute)
            })
        })
        .collect::<Vec<_>>();

    let duplicates = declared
        .iter()
        .filter(|(_, _, attribute)| !attribute.is_ignored())
        .map(|(field, column, _)| (*column, *field))
        .into_group_map()
        .into_iter()
        .filter(|(_, fields)| fields.len() > 1)
        .sorted_by(|left, right| left.0.cmp(right.0))
        .map(|(column, fields)| format!("'{column}' ({})", fields.join(", ")))
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        return Err(SheetError::DuplicateName(format!(
            "Several fields are declared for the same column: {}",
            duplicates.join("; ")
        )));
    }

    let mut added = 0usize;
    for (field, column, attribute) in declared {
        let mapping = options.handle().mapping();
        if mapping.iter().any(|profile| profile.name() == field) {
            continue;
        }
        if attribute.is_ignored() {
            options.ignore_property(field, column);
            continue;
        }
        if mapping.iter().any(|profile| profile.column_name() == column) {
            debug!("Column '{column}' is already mapped; skipping declaration on '{field}'");
            continue;
        }
        let profile = match attribute.converter_type_ref() {
            Some(converter) => ColumnMapProfile::with_converter_type(field, column, *converter)?,
            None => ColumnMapProfile::with_column(field, column)?,
        };
        options.add_map_profile(profile.ordered(attribute.order_value()))?;
        added += 1;
    }
    if added > 0 {
        debug!("Merged {added} declared profile(s)");
    }
    Ok(())
}

/// Explicit option styles win, then the type's whole-style declarations,
/// then its font/cell/border aspects.
pub fn apply_type_styles(options: &mut WriteOptions, styles: &TypeStyles) {
    if options.header_style.is_none() {
        options.header_style = styles.header.resolve();
    }
    if options.body_style.is_none() {
        options.body_style = styles.body.resolve();
    }
}
