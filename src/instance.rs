use std::rc::Rc;

use itertools::Itertools;

use crate::attribute::Attribute;
use crate::entropy::label_counts;
use crate::error::{Error, Result};
use crate::table::Table;

/// Attribute definitions shared by every subset of one dataset.
#[derive(Debug)]
pub struct Header {
    pub attributes: Vec<Attribute>,
    pub class: Attribute,
}

#[derive(Clone, Debug)]
pub struct Instance {
    // index of the attribute value, since strings are slow
    pub attribute_values: Vec<usize>,
    pub class_value: usize,
}

impl Instance {
    pub fn value(&self, attr: &Attribute) -> usize {
        self.attribute_values[attr.index]
    }

    pub fn is_missing(&self, attr: &Attribute) -> bool {
        attr.is_unknown(self.value(attr))
    }
}

/// Categorical view of a table: every selected column coerced to strings
/// and interned.
#[derive(Clone, Debug)]
pub struct Instances {
    pub header: Rc<Header>,
    pub instances: Vec<Instance>,
}

impl Instances {
    pub fn from_table(
        table: &Table,
        features: &[String],
        target: &str,
        marker: &str,
    ) -> Result<Self> {
        let target_column = table.require(target)?;
        let feature_columns = features
            .iter()
            .map(|name| table.require(name))
            .collect::<Result<Vec<_>>>()?;

        let mut attributes = features
            .iter()
            .enumerate()
            .map(|(i, name)| Attribute::new(name.clone(), i))
            .collect_vec();
        let mut class = Attribute::new(target, features.len());

        let mut instances = Vec::with_capacity(table.num_rows());
        for row in 0..table.num_rows() {
            let attribute_values = feature_columns
                .iter()
                .zip(attributes.iter_mut())
                .map(|(column, attr)| attr.add_value(&column.text(row, marker), marker))
                .collect_vec();
            let class_value = class.add_value(&target_column.text(row, marker), marker);
            instances.push(Instance {
                attribute_values,
                class_value,
            });
        }

        Ok(Instances {
            header: Rc::new(Header { attributes, class }),
            instances,
        })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn attribute(&self, index: usize) -> &Attribute {
        &self.header.attributes[index]
    }

    pub fn class_attribute(&self) -> &Attribute {
        &self.header.class
    }

    pub fn class_name(&self, value: usize) -> &str {
        self.class_attribute().value_name(value)
    }

    pub fn filter<F>(&self, mut keep: F) -> Instances
    where
        F: FnMut(&Instance) -> bool,
    {
        Instances {
            header: Rc::clone(&self.header),
            instances: self
                .instances
                .iter()
                .filter(|i| keep(i))
                .cloned()
                .collect(),
        }
    }

    /// Rows whose class is not the unknown marker.
    pub fn with_known_class(&self) -> Instances {
        let class = self.class_attribute();
        self.filter(|i| !class.is_unknown(i.class_value))
    }

    /// Rows whose value for `attr` is not the unknown marker.
    pub fn with_known(&self, attr: &Attribute) -> Instances {
        self.filter(|i| !i.is_missing(attr))
    }

    pub fn has_missing(&self, attr: &Attribute) -> bool {
        self.instances.iter().any(|i| i.is_missing(attr))
    }

    /// Class counts in order of first appearance.
    pub fn class_frequencies(&self) -> Vec<(usize, usize)> {
        label_counts(self.instances.iter().map(|i| i.class_value))
    }

    /// Most frequent class; the first one seen wins a tie.
    pub fn majority_class(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (class, count) in self.class_frequencies() {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class)
    }

    /// Subsets per known value of `attr`, in order of first appearance.
    pub fn partition(&self, attr: &Attribute) -> Vec<(usize, Instances)> {
        let values = self
            .instances
            .iter()
            .map(|i| i.value(attr))
            .filter(|&v| !attr.is_unknown(v))
            .unique()
            .collect_vec();
        values
            .into_iter()
            .map(|v| (v, self.filter(|i| i.value(attr) == v)))
            .collect()
    }
}

/// Rejects a selection that cannot be turned into a tree.
pub fn validate_selection(table: &Table, features: &[String], target: &str) -> Result<()> {
    if target.is_empty() {
        return Err(Error::NoTarget);
    }
    if features.is_empty() {
        return Err(Error::NoFeatures);
    }
    table.require(target)?;
    for feature in features {
        if feature == target {
            return Err(Error::TargetAsFeature(feature.clone()));
        }
        table.require(feature)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn dataset() -> Instances {
        let table = Table::new(vec![
            Column::from_strs("a", &["foo", "foo", "bar", "?", "foo"]),
            Column::from_strs("class", &["first", "second", "second", "first", "?"]),
        ])
        .unwrap();
        Instances::from_table(&table, &["a".to_string()], "class", "?").unwrap()
    }

    #[test]
    fn test_interning_first_seen() {
        let data = dataset();
        let a = data.attribute(0);
        assert_eq!(a.value_name(0), "foo");
        assert_eq!(a.value_name(1), "bar");
        assert_eq!(a.unknown, Some(2));
        assert_eq!(data.class_attribute().unknown, Some(2));
    }

    #[test]
    fn test_known_filters() {
        let data = dataset();
        assert_eq!(data.with_known_class().len(), 4);
        assert_eq!(data.with_known(data.attribute(0)).len(), 4);
        assert!(data.has_missing(data.attribute(0)));
    }

    #[test]
    fn test_majority_tie_goes_to_first_seen() {
        let data = dataset().with_known_class();
        assert_eq!(data.class_frequencies(), vec![(0, 2), (1, 2)]);
        assert_eq!(data.majority_class(), Some(0));
    }

    #[test]
    fn test_partition_skips_unknown() {
        let data = dataset();
        let parts = data.partition(data.attribute(0));
        let sizes = parts.iter().map(|(v, p)| (*v, p.len())).collect_vec();
        assert_eq!(sizes, vec![(0, 3), (1, 1)]);
    }

    #[test]
    fn test_validate_selection() {
        let table = Table::new(vec![
            Column::from_strs("a", &["x"]),
            Column::from_strs("b", &["y"]),
        ])
        .unwrap();
        assert!(matches!(validate_selection(&table, &[], "b"), Err(Error::NoFeatures)));
        assert!(matches!(
            validate_selection(&table, &["a".to_string()], ""),
            Err(Error::NoTarget)
        ));
        assert!(matches!(
            validate_selection(&table, &["b".to_string()], "b"),
            Err(Error::TargetAsFeature(_))
        ));
        assert!(matches!(
            validate_selection(&table, &["z".to_string()], "b"),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(validate_selection(&table, &["a".to_string()], "b").is_ok());
    }
}
