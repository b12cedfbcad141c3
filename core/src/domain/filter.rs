//! Filtering, ordering and category counts for entry listings.

use serde::{Deserialize, Serialize};

use super::{Category, ListeningEntry};

/// Filter criteria for entry listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Only keep entries in this category.
    #[serde(default)]
    pub category: Option<Category>,
    /// Case-insensitive text matched against process name, port and PID.
    #[serde(default)]
    pub search_text: String,
}

impl EntryFilter {
    /// Create a new filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the filter has any active conditions.
    pub fn is_active(&self) -> bool {
        self.category.is_some() || !self.search_text.is_empty()
    }

    /// Check if an entry matches all filter criteria.
    pub fn matches(&self, entry: &ListeningEntry) -> bool {
        if let Some(category) = self.category {
            if entry.category() != category {
                return false;
            }
        }
        entry.matches_search(&self.search_text)
    }

    /// Set the search text.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Apply this filter and sort the survivors by port.
    pub fn apply(&self, entries: &[ListeningEntry]) -> Vec<ListeningEntry> {
        apply(entries, self.category, &self.search_text)
    }
}

/// Filter entries by category and search text, then sort ascending by port.
///
/// The sort is stable: entries sharing a port keep their input order.
pub fn apply(
    entries: &[ListeningEntry],
    category: Option<Category>,
    search_text: &str,
) -> Vec<ListeningEntry> {
    let query = search_text.to_lowercase();
    let mut result: Vec<ListeningEntry> = entries
        .iter()
        .filter(|e| category.map_or(true, |c| e.category() == c))
        .filter(|e| e.matches_search(&query))
        .cloned()
        .collect();
    result.sort_by_key(|e| e.port);
    result
}

/// Count entries per category, in canonical order, omitting empty categories.
pub fn histogram(entries: &[ListeningEntry]) -> Vec<(Category, usize)> {
    let mut counts = [0usize; 5];
    for entry in entries {
        counts[entry.category() as usize] += 1;
    }
    Category::ALL
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(port: u16, pid: i32, name: &str) -> ListeningEntry {
        ListeningEntry::new(port, pid, name, "user", "*")
    }

    #[test]
    fn test_category_then_search() {
        let entries = vec![entry(8080, 1, "java"), entry(5432, 2, "postgres")];

        let result = apply(&entries, Some(Category::Database), "54");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].port, 5432);

        // Same outcome with the filters expressed the other way round
        let by_text = apply(&entries, None, "54");
        let result = apply(&by_text, Some(Category::Database), "");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].port, 5432);
    }

    #[test]
    fn test_sorted_by_port() {
        let entries = vec![entry(8080, 1, "java"), entry(22, 2, "sshd"), entry(5432, 3, "postgres")];
        let ports: Vec<u16> = apply(&entries, None, "").iter().map(|e| e.port).collect();
        assert_eq!(ports, vec![22, 5432, 8080]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let entries = vec![entry(3000, 20, "node"), entry(80, 5, "nginx"), entry(3000, 10, "node")];
        let pids: Vec<i32> = apply(&entries, None, "").iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![5, 20, 10]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let entries = vec![entry(3000, 1, "Node"), entry(80, 2, "nginx")];
        let result = apply(&entries, None, "NODE");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].process_name, "Node");

        // PID substring
        let entries = vec![entry(3000, 4711, "node"), entry(80, 2, "nginx")];
        let result = apply(&entries, None, "471");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_histogram() {
        let entries = vec![
            entry(40000, 1, "a"),
            entry(22, 2, "sshd"),
            entry(3000, 3, "node"),
            entry(3001, 4, "node"),
            entry(5432, 5, "postgres"),
        ];
        assert_eq!(
            histogram(&entries),
            vec![
                (Category::WebDev, 2),
                (Category::Database, 1),
                (Category::System, 1),
                (Category::Other, 1),
            ]
        );
        assert!(histogram(&[]).is_empty());
    }

    #[test]
    fn test_filter_value() {
        let filter = EntryFilter::new();
        assert!(!filter.is_active());

        let filter = filter.with_search("node").with_category(Some(Category::WebDev));
        assert!(filter.is_active());
        assert!(filter.matches(&entry(3000, 1, "node")));
        assert!(!filter.matches(&entry(8000, 1, "node")));
    }
}
