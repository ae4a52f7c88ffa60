use crate::attribute_info::NominalAttributeInfo;

#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: String,
    pub index: usize,
    pub attribute_info: NominalAttributeInfo,
    /// Interned index of the unknown marker, if any row carries it.
    pub unknown: Option<usize>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Attribute {
            name: name.into(),
            index,
            attribute_info: NominalAttributeInfo::default(),
            unknown: None,
        }
    }

    pub fn value_name(&self, index: usize) -> &str {
        self.attribute_info.value(index).unwrap_or_default()
    }

    pub fn is_unknown(&self, value: usize) -> bool {
        self.unknown == Some(value)
    }

    pub(crate) fn add_value(&mut self, value: &str, marker: &str) -> usize {
        let index = self.attribute_info.intern(value);
        if value == marker {
            self.unknown = Some(index);
        }
        index
    }
}
