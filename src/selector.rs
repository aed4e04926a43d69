use itertools::Itertools;

use crate::backend::WorkbookSource;
use crate::error::{Result, SheetError};

/// Which sheets a read operation visits. Indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
    Indices(Vec<usize>),
    Names(Vec<String>),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl SheetSelector {
    /// Checks the selector's own shape; needs no workbook.
    pub fn validate(&self) -> Result<()> {
        match self {
            SheetSelector::Index(_) => Ok(()),
            SheetSelector::Name(name) => ensure_named(name),
            SheetSelector::Indices(indices) if indices.is_empty() => Err(
                SheetError::InvalidArgument("The sheet index list is empty".to_string()),
            ),
            SheetSelector::Indices(_) => Ok(()),
            SheetSelector::Names(names) if names.is_empty() => Err(SheetError::InvalidArgument(
                "The sheet name list is empty".to_string(),
            )),
            SheetSelector::Names(names) => names.iter().try_for_each(|name| ensure_named(name)),
        }
    }

    /// Resolves to sheet positions in selector order.
    pub fn resolve(&self, workbook: &dyn WorkbookSource) -> Result<Vec<usize>> {
        self.validate()?;
        let count = workbook.sheet_count();
        let in_range = |index: usize| {
            if index < count {
                Ok(index)
            } else {
                Err(SheetError::IndexOutOfRange { index, count })
            }
        };
        match self {
            SheetSelector::Index(index) => Ok(vec![in_range(*index)?]),
            SheetSelector::Indices(indices) => indices.iter().map(|index| in_range(*index)).collect(),
            SheetSelector::Name(name) => workbook
                .sheet_index_by_name(name)
                .map(|index| vec![index])
                .ok_or_else(|| SheetError::SheetNotFound { name: name.clone() }),
            SheetSelector::Names(names) => {
                let missing = names
                    .iter()
                    .filter(|name| workbook.sheet_index_by_name(name).is_none())
                    .unique()
                    .join(", ");
                if !missing.is_empty() {
                    return Err(SheetError::SheetNotFound { name: missing });
                }
                Ok(names
                    .iter()
                    .filter_map(|name| workbook.sheet_index_by_name(name))
                    .collect())
            }
        }
    }
}

fn ensure_named(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SheetError::InvalidArgument(
            "Sheet names must not be blank".to_string(),
        ));
    }
    Ok(())
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        SheetSelector::Index(index)
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl From<Vec<usize>> for SheetSelector {
    fn from(indices: Vec<usize>) -> Self {
        SheetSelector::Indices(indices)
    }
}

impl From<Vec<String>> for SheetSelector {
    fn from(names: Vec<String>) -> Self {
        SheetSelector::Names(names)
    }
}

impl From<&[&str]> for SheetSelector {
    fn from(names: &[&str]) -> Self {
        SheetSelector::Names(names.iter().map(|name| name.to_string()).collect())
    }
}
