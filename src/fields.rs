//! Reactive field nodes backing dependent metadata dropdowns.
//!
//! Each selectable control is one [`FieldInfo`] node. Adapters declare the
//! parent→child edges explicitly in their `select` implementation; a parent
//! selection hands its epoch to every child fetch it triggers, and
//! [`FieldInfo::replace_options`] discards resolutions that arrive after a
//! newer selection has already written (last-write-wins).

use std::sync::{Arc, Mutex};

/// One selectable entry of a field's option list. The only structural
/// requirement across backends is a unique id and a displayable name;
/// `template_id` carries the Gemini project-template link used to derive
/// dependent metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
    pub template_id: Option<String>,
}

impl FieldOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            template_id: None,
        }
    }

    /// Empty entry substituted when a backend returns zero options, so a
    /// bound control is never left with an empty set.
    pub fn placeholder() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct FieldState {
    options: Vec<FieldOption>,
    value: Option<FieldOption>,
    selection_epoch: u64,
    applied_epoch: u64,
}

/// Cheaply clonable handle over one cascading selection control.
///
/// Options are only ever replaced wholesale, never mutated incrementally.
/// Callers must treat `options()` as eventually consistent: population
/// happens out of band after `fields()` returns the graph.
#[derive(Clone)]
pub struct FieldInfo {
    inner: Arc<FieldInner>,
}

struct FieldInner {
    id: &'static str,
    caption: &'static str,
    state: Mutex<FieldState>,
}

impl FieldInfo {
    pub fn new(id: &'static str, caption: &'static str) -> Self {
        Self {
            inner: Arc::new(FieldInner {
                id,
                caption,
                state: Mutex::new(FieldState::default()),
            }),
        }
    }

    pub fn id(&self) -> &'static str {
        self.inner.id
    }

    pub fn caption(&self) -> &'static str {
        self.inner.caption
    }

    pub fn options(&self) -> Vec<FieldOption> {
        self.inner.state.lock().unwrap().options.clone()
    }

    pub fn value(&self) -> Option<FieldOption> {
        self.inner.state.lock().unwrap().value.clone()
    }

    /// Records a selection and returns the epoch that tags every child
    /// fetch triggered by this change.
    pub fn set_value(&self, option: FieldOption) -> u64 {
        let mut state = self.inner.state.lock().unwrap();
        state.value = Some(option);
        state.selection_epoch += 1;
        state.selection_epoch
    }

    pub fn clear_value(&self) {
        self.inner.state.lock().unwrap().value = None;
    }

    /// Replaces the option list wholesale for a fetch tagged with `epoch`.
    ///
    /// Returns `false` without touching the list when a fetch tagged with a
    /// newer epoch has already written. A selected value missing from the
    /// new list is cleared.
    pub fn replace_options(&self, epoch: u64, options: Vec<FieldOption>) -> bool {
        let mut state = self.inner.state.lock().unwrap();
        if epoch < state.applied_epoch {
            return false;
        }
        state.applied_epoch = epoch;
        if let Some(current) = &state.value {
            if !options.iter().any(|option| option.id == current.id) {
                state.value = None;
            }
        }
        state.options = options;
        true
    }

    /// Unconditional replacement used for root fields, which have no parent
    /// selection to sequence against.
    pub fn populate(&self, options: Vec<FieldOption>) {
        let mut state = self.inner.state.lock().unwrap();
        if let Some(current) = &state.value {
            if !options.iter().any(|option| option.id == current.id) {
                state.value = None;
            }
        }
        state.options = options;
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldInfo, FieldOption};

    #[test]
    fn options_start_empty_and_value_unset() {
        let field = FieldInfo::new("project", "Project");
        assert!(field.options().is_empty());
        assert!(field.value().is_none());
    }

    #[test]
    fn replace_options_is_wholesale() {
        let field = FieldInfo::new("component", "Component");
        assert!(field.replace_options(1, vec![FieldOption::new("a", "Alpha")]));
        assert!(field.replace_options(2, vec![FieldOption::new("b", "Beta")]));

        let options = field.options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, "b");
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let field = FieldInfo::new("component", "Component");
        assert!(field.replace_options(2, vec![FieldOption::new("new", "New")]));
        assert!(!field.replace_options(1, vec![FieldOption::new("old", "Old")]));
        assert_eq!(field.options()[0].id, "new");
    }

    #[test]
    fn same_epoch_resolution_still_wins() {
        // Two fetches for the same triggering selection: the later arrival
        // overwrites, last-write-wins.
        let field = FieldInfo::new("type", "Type");
        assert!(field.replace_options(3, vec![FieldOption::new("first", "First")]));
        assert!(field.replace_options(3, vec![FieldOption::new("second", "Second")]));
        assert_eq!(field.options()[0].id, "second");
    }

    #[test]
    fn selection_epochs_are_monotonic() {
        let field = FieldInfo::new("project", "Project");
        let first = field.set_value(FieldOption::new("p1", "One"));
        let second = field.set_value(FieldOption::new("p2", "Two"));
        assert!(second > first);
        assert_eq!(field.value().map(|option| option.id), Some("p2".to_string()));
    }

    #[test]
    fn replacement_clears_value_missing_from_new_list() {
        let field = FieldInfo::new("component", "Component");
        field.replace_options(1, vec![FieldOption::new("a", "Alpha")]);
        field.set_value(FieldOption::new("a", "Alpha"));

        field.replace_options(2, vec![FieldOption::new("b", "Beta")]);
        assert!(field.value().is_none());

        field.set_value(FieldOption::new("b", "Beta"));
        field.replace_options(3, vec![FieldOption::new("b", "Beta renamed")]);
        assert_eq!(field.value().map(|option| option.id), Some("b".to_string()));
    }

    #[test]
    fn handles_share_state() {
        let field = FieldInfo::new("status", "Status");
        let alias = field.clone();
        alias.populate(vec![FieldOption::new("open", "Open")]);
        assert_eq!(field.options().len(), 1);
    }
}
