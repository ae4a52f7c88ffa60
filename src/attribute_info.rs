use std::collections::HashMap;

/// Interned labels of one nominal attribute, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct NominalAttributeInfo {
    // The attribute's values
    pub values: Vec<String>,

    // Mapping of values to indices
    pub hashtable: HashMap<String, usize>,
}

impl NominalAttributeInfo {
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.hashtable.get(value).copied()
    }

    /// Index of `value`, adding it as a new label if unseen.
    pub fn intern(&mut self, value: &str) -> usize {
        if let Some(i) = self.index_of(value) {
            return i;
        }
        self.values.push(value.to_string());
        self.hashtable
            .insert(value.to_string(), self.values.len() - 1);
        self.values.len() - 1
    }
}
