#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerItem {
    pub id: String,
    pub label: String,
    /// Secondary text shown under the label and matched by the filter.
    pub detail: String,
}

/// A selectable list with a type-to-filter query.
///
/// `selected` indexes into the filtered view, not into `items`.
#[derive(Debug, Clone)]
pub struct PickerState {
    pub title: String,
    pub items: Vec<PickerItem>,
    pub selected: usize,
    filter: String,
    visible: Vec<usize>,
}

impl PickerState {
    pub fn new<T: Into<String>>(title: T, items: Vec<PickerItem>, selected: usize) -> Self {
        let visible = (0..items.len()).collect();
        let selected = selected.min(items.len().saturating_sub(1));
        Self {
            title: title.into(),
            items,
            selected,
            filter: String::new(),
            visible,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Items matching the current filter, in original order.
    pub fn visible_items(&self) -> impl Iterator<Item = &PickerItem> {
        self.visible.iter().map(|&index| &self.items[index])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_item(&self) -> Option<&PickerItem> {
        self.visible
            .get(self.selected)
            .map(|&index| &self.items[index])
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_item().map(|item| item.id.as_str())
    }

    pub fn move_up(&mut self) {
        if !self.visible.is_empty() {
            if self.selected == 0 {
                self.selected = self.visible.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn move_down(&mut self) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + 1) % self.visible.len();
        }
    }

    pub fn push_filter_char(&mut self, ch: char) {
        self.filter.push(ch);
        self.refilter();
    }

    pub fn pop_filter_char(&mut self) {
        if self.filter.pop().is_some() {
            self.refilter();
        }
    }

    /// Drop the filter, keeping the highlighted entry when there is one.
    pub fn clear_filter(&mut self) {
        if !self.filter.is_empty() {
            self.filter.clear();
            self.refilter();
        }
    }

    fn refilter(&mut self) {
        let keep = self.selected_item().map(|item| item.id.clone());
        let needle = self.filter.to_lowercase();
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                needle.is_empty()
                    || item.label.to_lowercase().contains(&needle)
                    || item.detail.to_lowercase().contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();
        self.selected = keep
            .and_then(|id| self.visible.iter().position(|&i| self.items[i].id == id))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, label: &str, detail: &str) -> PickerItem {
        PickerItem {
            id: id.into(),
            label: label.into(),
            detail: detail.into(),
        }
    }

    fn picker() -> PickerState {
        PickerState::new(
            "Roles",
            vec![
                item("swe", "Software Engineer", "writes code"),
                item("sre", "Site Reliability Engineer", "keeps it running"),
                item("writer", "Writer", "edits prose"),
            ],
            0,
        )
    }

    #[test]
    fn movement_wraps_both_ways() {
        let mut state = picker();
        state.move_up();
        assert_eq!(state.selected_id(), Some("writer"));
        state.move_down();
        assert_eq!(state.selected_id(), Some("swe"));
    }

    #[test]
    fn filter_matches_label_and_detail_case_insensitively() {
        let mut state = picker();
        for ch in "ENGINEER".chars() {
            state.push_filter_char(ch);
        }
        assert_eq!(state.visible_len(), 2);

        state.pop_filter_char();
        for ch in "prose".chars() {
            state.push_filter_char(ch);
        }
        assert_eq!(state.filter(), "ENGINEEprose");
        assert_eq!(state.visible_len(), 0);
        assert_eq!(state.selected_id(), None);
    }

    #[test]
    fn filter_keeps_selection_when_still_visible() {
        let mut state = picker();
        state.move_down();
        state.push_filter_char('r');
        assert_eq!(state.selected_id(), Some("sre"));

        state.push_filter_char('u');
        // "ru" only appears in "keeps it running".
        assert_eq!(state.selected_id(), Some("sre"));
        state.pop_filter_char();
        state.pop_filter_char();
        assert_eq!(state.visible_len(), 3);
    }
}
