//! training objects and the binary decision attribute.

use crate::error::RionidaError;

/// a binary decision attribute.
///
/// labels are kept sorted so the local codes `0` and `1` do not depend on
/// the order the records were read in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionAttribute {
    labels: [String; 2],
}

impl DecisionAttribute {
    /// builds the attribute from every label found in a table
    pub fn from_labels<'a, I>(labels: I) -> Result<Self, RionidaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut distinct: Vec<&str> = Vec::new();

        for label in labels {
            if !distinct.contains(&label) {
                distinct.push(label);
            }
        }

        if distinct.len() != 2 {
            return Err(RionidaError::NotBinary {
                found: distinct.len(),
            });
        }

        distinct.sort_unstable();

        Ok(Self {
            labels: [distinct[0].to_owned(), distinct[1].to_owned()],
        })
    }

    pub fn no_of_values(&self) -> usize {
        self.labels.len()
    }

    /// translates a label into its local code
    pub fn local_code(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|known| known == label)
    }

    /// translates a local code back into its label
    pub fn global_code(&self, local: usize) -> &str {
        &self.labels[local]
    }

    pub fn labels(&self) -> &[String; 2] {
        &self.labels
    }
}

/// one training object
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub data: Vec<f64>,
    /// local code of the decision
    pub class: usize,
}

/// the training objects along with their decision attribute
#[derive(Debug, Clone)]
pub struct TrainingTable {
    records: Vec<Record>,
    attributes: usize,
    decision: DecisionAttribute,
    counts: [usize; 2],
}

impl TrainingTable {
    /// builds a table from attribute values paired with their decision label
    pub fn from_labelled<S>(rows: Vec<(Vec<f64>, S)>) -> Result<Self, RionidaError>
    where
        S: AsRef<str>,
    {
        let decision = DecisionAttribute::from_labels(rows.iter().map(|(_, label)| label.as_ref()))?;

        let records = rows
            .into_iter()
            .map(|(data, label)| Record {
                // both labels are known since the attribute was built from them
                class: decision.local_code(label.as_ref()).unwrap_or_default(),
                data,
            })
            .collect();

        Self::new(records, decision)
    }

    pub fn new(records: Vec<Record>, decision: DecisionAttribute) -> Result<Self, RionidaError> {
        let Some(first) = records.first() else {
            return Err(RionidaError::EmptyTable);
        };

        let attributes = first.data.len();
        let mut counts = [0usize; 2];

        for record in &records {
            if record.data.len() != attributes {
                return Err(RionidaError::DimensionMismatch {
                    expected: attributes,
                    found: record.data.len(),
                });
            }

            if record.class >= decision.no_of_values() {
                return Err(RionidaError::NotBinary {
                    found: record.class + 1,
                });
            }

            counts[record.class] += 1;
        }

        Ok(Self {
            records,
            attributes,
            decision,
            counts,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn attributes(&self) -> usize {
        self.attributes
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> &Record {
        &self.records[index]
    }

    pub fn decision(&self) -> &DecisionAttribute {
        &self.decision
    }

    /// number of objects per local decision code
    pub fn class_counts(&self) -> [usize; 2] {
        self.counts
    }

    /// local code of the less frequent class. on a tie code `1` is the
    /// minority. `swap` flips the choice
    pub fn minority_class(&self, swap: bool) -> usize {
        let minority = if self.counts[0] < self.counts[1] { 0 } else { 1 };

        if swap { 1 - minority } else { minority }
    }

    /// a new table holding the given objects in the given order
    pub fn subset(&self, indices: &[usize]) -> Result<Self, RionidaError> {
        let records = indices
            .iter()
            .map(|index| self.records[*index].clone())
            .collect();

        Self::new(records, self.decision.clone())
    }

    /// checks that a query matches the table's attribute count
    pub fn check_query(&self, query: &[f64]) -> Result<(), RionidaError> {
        if query.len() != self.attributes {
            return Err(RionidaError::DimensionMismatch {
                expected: self.attributes,
                found: query.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> TrainingTable {
        TrainingTable::from_labelled(vec![
            (vec![0.0, 0.0], "yes"),
            (vec![1.0, 0.0], "no"),
            (vec![0.0, 1.0], "no"),
            (vec![1.0, 1.0], "no"),
        ])
        .unwrap()
    }

    #[test]
    fn labels_are_sorted() {
        let table = table();

        assert_eq!(table.decision().global_code(0), "no");
        assert_eq!(table.decision().global_code(1), "yes");
        assert_eq!(table.decision().local_code("yes"), Some(1));
        assert_eq!(table.decision().local_code("maybe"), None);
        assert_eq!(table.class_counts(), [3, 1]);
    }

    #[test]
    fn minority_class() {
        let table = table();

        assert_eq!(table.minority_class(false), 1);
        assert_eq!(table.minority_class(true), 0);
    }

    #[test]
    fn minority_tie_picks_second_label() {
        let table =
            TrainingTable::from_labelled(vec![(vec![0.0], "a"), (vec![1.0], "b")]).unwrap();

        assert_eq!(table.minority_class(false), 1);
    }

    #[test]
    fn non_binary_decision_is_rejected() {
        let result = TrainingTable::from_labelled(vec![
            (vec![0.0], "a"),
            (vec![1.0], "b"),
            (vec![2.0], "c"),
        ]);

        assert_eq!(result.unwrap_err(), RionidaError::NotBinary { found: 3 });

        let result = TrainingTable::from_labelled(vec![(vec![0.0], "a"), (vec![1.0], "a")]);

        assert_eq!(result.unwrap_err(), RionidaError::NotBinary { found: 1 });
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = TrainingTable::from_labelled(vec![(vec![0.0, 1.0], "a"), (vec![1.0], "b")]);

        assert_eq!(
            result.unwrap_err(),
            RionidaError::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn subset_keeps_decision_attribute() {
        let table = table();
        let subset = table.subset(&[3, 0]).unwrap();

        assert_eq!(subset.len(), 2);
        assert_eq!(subset.record(0).data, vec![1.0, 1.0]);
        assert_eq!(subset.decision(), table.decision());
        assert_eq!(subset.class_counts(), [1, 1]);
    }
}
