use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};

use core_vidtile::services::files::{get_file_list, get_folder_list, ListOptions};

use super::{Picked, PromptError};

/// Ask for a value. Empty input takes `default`; text that doesn't parse is
/// rejected and asked again.
pub fn prompt_with_default<T>(message: &str, default: Option<T>) -> Result<T, PromptError>
where
    T: Clone + ToString + FromStr,
    T::Err: ToString,
{
    let theme = ColorfulTheme::default();
    let mut input = Input::<T>::with_theme(&theme).with_prompt(message);
    if let Some(default) = default {
        input = input.default(default);
    }
    Ok(input.interact_text()?)
}

pub fn confirm(message: &str, yes_is_default: bool) -> Result<bool, PromptError> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(yes_is_default)
        .interact()?)
}

/// Tick any number of `items`; all start ticked.
pub fn multi_select<T: ToString>(heading: &str, items: &[T]) -> Result<Vec<usize>, PromptError> {
    let defaults = vec![true; items.len()];
    Ok(MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(heading)
        .items(items)
        .defaults(&defaults)
        .interact()?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Existing { index: usize, entry: String },
    Created(String),
}

/// Numbered list prompt. Entries are picked by their 1-based number.
///
/// Empty input takes `default` (a lone entry is always the default); any
/// other text names a new entry when `allow_creation` is set.
pub fn select_from_list(
    entries: &[String],
    heading: &str,
    default: Option<&str>,
    allow_creation: bool,
) -> Result<Selection, PromptError> {
    let default_index = default_index(entries, default);

    println!();
    println!("{heading}");
    if allow_creation {
        println!("(or create new entry)");
    }
    println!();
    for line in list_lines(entries, default_index) {
        println!("{line}");
    }

    let response: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Selection")
        .allow_empty(true)
        .interact_text()?;

    resolve_selection(entries, default_index, allow_creation, &response)
}

/// Pick a file in `dir`, or name a new one.
pub async fn file_list_select(
    dir: &Path,
    heading: &str,
    default: Option<&str>,
    allow_creation: bool,
) -> Result<Picked, PromptError> {
    let names = get_file_list(dir, ListOptions::default()).await?;
    pick_from(dir, &names, heading, default, allow_creation)
}

/// Pick a folder in `dir`, or name a new one.
pub async fn folder_list_select(
    dir: &Path,
    heading: &str,
    default: Option<&str>,
    allow_creation: bool,
) -> Result<Picked, PromptError> {
    let options = ListOptions {
        create_missing_folder: allow_creation,
        ..Default::default()
    };
    let names = get_folder_list(dir, options).await?;
    pick_from(dir, &names, heading, default, allow_creation)
}

fn pick_from(
    dir: &Path,
    names: &[PathBuf],
    heading: &str,
    default: Option<&str>,
    allow_creation: bool,
) -> Result<Picked, PromptError> {
    let entries: Vec<String> = names
        .iter()
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    let selection = select_from_list(&entries, heading, default, allow_creation)?;
    if let Selection::Existing { index, .. } = &selection {
        tracing::debug!(index, "picked list entry");
    }
    Ok(Picked::from_selection(dir, selection))
}

fn default_index(entries: &[String], default: Option<&str>) -> Option<usize> {
    if entries.len() == 1 {
        return Some(0);
    }
    default.and_then(|default| entries.iter().position(|entry| entry == default))
}

fn list_lines(entries: &[String], default_index: Option<usize>) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let marker = if Some(index) == default_index {
                " >> (default)"
            } else {
                ""
            };
            format!("  {} - {}{}", index + 1, entry, marker)
        })
        .collect()
}

fn resolve_selection(
    entries: &[String],
    default_index: Option<usize>,
    allow_creation: bool,
    response: &str,
) -> Result<Selection, PromptError> {
    let response = response.trim();

    let index = if response.is_empty() {
        default_index.ok_or(PromptError::NoDefault)?
    } else if response.bytes().all(|b| b.is_ascii_digit()) {
        let number: usize = response
            .parse()
            .map_err(|_| PromptError::OutOfRange(response.to_owned()))?;
        if number == 0 || number > entries.len() {
            return Err(PromptError::OutOfRange(response.to_owned()));
        }
        number - 1
    } else if allow_creation {
        return Ok(Selection::Created(response.to_owned()));
    } else {
        return Err(PromptError::Unrecognized(response.to_owned()));
    };

    Ok(Selection::Existing {
        index,
        entry: entries[index].clone(),
    })
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Existing { entry, .. } => write!(f, "{entry}"),
            Selection::Created(entry) => write!(f, "{entry} (new)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<String> {
        vec!["a.avi".into(), "b.avi".into(), "c.avi".into()]
    }

    #[test]
    fn numbers_are_one_based() {
        let selection = resolve_selection(&entries(), None, false, " 2 ").unwrap();
        assert_eq!(
            selection,
            Selection::Existing {
                index: 1,
                entry: "b.avi".into()
            }
        );
    }

    #[test]
    fn empty_input_takes_the_default() {
        let entries = entries();
        let default = default_index(&entries, Some("c.avi"));
        assert_eq!(default, Some(2));

        let selection = resolve_selection(&entries, default, false, "").unwrap();
        assert_eq!(selection.to_string(), "c.avi");

        let err = resolve_selection(&entries, None, false, "").unwrap_err();
        assert!(matches!(err, PromptError::NoDefault));
    }

    #[test]
    fn a_lone_entry_is_the_default() {
        let only = vec!["only.avi".to_string()];
        assert_eq!(default_index(&only, None), Some(0));
        assert_eq!(default_index(&only, Some("other.avi")), Some(0));
        assert_eq!(default_index(&entries(), Some("missing.avi")), None);
    }

    #[test]
    fn out_of_range_numbers_are_errors() {
        for response in ["0", "4", "99999999999999999999999"] {
            let err = resolve_selection(&entries(), None, true, response).unwrap_err();
            assert!(matches!(err, PromptError::OutOfRange(_)), "{response}");
        }
    }

    #[test]
    fn text_creates_only_when_allowed() {
        let selection = resolve_selection(&entries(), None, true, "new.avi").unwrap();
        assert_eq!(selection, Selection::Created("new.avi".into()));
        assert_eq!(selection.to_string(), "new.avi (new)");

        let err = resolve_selection(&entries(), None, false, "new.avi").unwrap_err();
        assert!(matches!(err, PromptError::Unrecognized(_)));
    }

    #[test]
    fn list_marks_the_default() {
        let lines = list_lines(&entries(), Some(1));
        assert_eq!(
            lines,
            ["  1 - a.avi", "  2 - b.avi >> (default)", "  3 - c.avi"]
        );
    }
}
