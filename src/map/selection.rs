/// Caller-side record of the single selected listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<String>,
}

impl Selection {
    /// Select `id`, returning the previously selected id if it differs
    pub fn select(&mut self, id: &str) -> Option<String> {
        if self.is_selected(id) {
            return None;
        }
        self.selected.replace(id.to_string())
    }

    pub fn clear(&mut self) -> Option<String> {
        self.selected.take()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_selection() {
        let mut selection = Selection::default();
        assert_eq!(selection.select("a"), None);
        assert_eq!(selection.select("a"), None);
        assert_eq!(selection.select("b"), Some("a".to_string()));
        assert!(selection.is_selected("b"));
        assert!(!selection.is_selected("a"));
        assert_eq!(selection.clear(), Some("b".to_string()));
        assert_eq!(selection.selected(), None);
    }
}
