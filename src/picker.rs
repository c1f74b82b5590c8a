//! "Pick one of N, or cancel."

use crate::error::{FractureError, Result};
use dialoguer::FuzzySelect;
use dialoguer::theme::ColorfulTheme;
use std::io;

/// Outcome of an interactive choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    Selected(T),
    Cancelled,
}

impl<T> Selection<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Selection<U> {
        match self {
            Self::Selected(value) => Selection::Selected(f(value)),
            Self::Cancelled => Selection::Cancelled,
        }
    }
}

/// Chooses one index out of `items`.
pub trait Picker {
    fn pick(&self, prompt: &str, items: &[String]) -> Result<Selection<usize>>;
}

/// Searchable terminal picker.
#[derive(Debug, Default)]
pub struct FuzzyPicker;

impl Picker for FuzzyPicker {
    fn pick(&self, prompt: &str, items: &[String]) -> Result<Selection<usize>> {
        if items.is_empty() {
            return Ok(Selection::Cancelled);
        }
        let choice = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt();

        match choice {
            Ok(Some(index)) => Ok(Selection::Selected(index)),
            Ok(None) => Ok(Selection::Cancelled),
            Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::Interrupted => {
                let _ = dialoguer::console::Term::stderr().show_cursor();
                Ok(Selection::Cancelled)
            }
            Err(e) => Err(FractureError::Prompt(e.to_string())),
        }
    }
}

/// Picker with a predetermined answer; `None` cancels.
#[derive(Debug, Clone, Default)]
pub struct FixedPicker {
    choice: Option<String>,
}

impl FixedPicker {
    /// Pick the first item equal to `item`, cancelling if it is absent
    pub fn choosing(item: impl Into<String>) -> Self {
        Self {
            choice: Some(item.into()),
        }
    }

    pub fn cancelling() -> Self {
        Self { choice: None }
    }
}

impl Picker for FixedPicker {
    fn pick(&self, _prompt: &str, items: &[String]) -> Result<Selection<usize>> {
        let found = self
            .choice
            .as_ref()
            .and_then(|choice| items.iter().position(|item| item == choice));
        Ok(match found {
            Some(index) => Selection::Selected(index),
            None => Selection::Cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        vec!["main".to_string(), "develop".to_string()]
    }

    #[test]
    fn test_fixed_picker_selects() {
        let picker = FixedPicker::choosing("develop");
        assert_eq!(picker.pick("Branch", &items()).unwrap(), Selection::Selected(1));
    }

    #[test]
    fn test_fixed_picker_cancels() {
        assert_eq!(
            FixedPicker::cancelling().pick("Branch", &items()).unwrap(),
            Selection::Cancelled
        );
        assert_eq!(
            FixedPicker::choosing("missing").pick("Branch", &items()).unwrap(),
            Selection::Cancelled
        );
    }

    #[test]
    fn test_selection_map() {
        let items = items();
        let picked = Selection::Selected(1).map(|i| items[i].clone());
        assert_eq!(picked, Selection::Selected("develop".to_string()));
        assert_eq!(Selection::<usize>::Cancelled.map(|i| i + 1), Selection::Cancelled);
    }

    #[test]
    fn test_fuzzy_picker_empty_items_cancel() {
        assert_eq!(FuzzyPicker.pick("Branch", &[]).unwrap(), Selection::Cancelled);
    }
}
