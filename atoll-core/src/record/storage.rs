//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and aggregates them on demand.
///
/// Scalar values are aggregated into min/max/mean/median; for other value
/// types the most recent occurrence wins.
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &Vec<f32>) -> RecordValue {
    RecordValue::Scalar(*vs.iter().min_by(|x, y| x.total_cmp(y)).unwrap())
}

fn max(vs: &Vec<f32>) -> RecordValue {
    RecordValue::Scalar(*vs.iter().max_by(|x, y| x.total_cmp(y)).unwrap())
}

fn mean(vs: &Vec<f32>) -> RecordValue {
    RecordValue::Scalar(vs.iter().map(|v| *v).sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn find(&self, key: &String) -> &RecordValue {
        for record in self.data.iter() {
            if let Some(value) = record.get(key) {
                return value;
            }
        }
        panic!("Key '{}' was not found. ", key);
    }

    /// Returns the most recent value for `key`, expecting the variant
    /// matched by `matches`.
    fn latest(
        &self,
        key: &String,
        matches: fn(&RecordValue) -> bool,
        type_name: &str,
    ) -> Record {
        for record in self.data.iter().rev() {
            if let Some(value) = record.get(key) {
                if matches(value) {
                    return Record::from_slice(&[(key, value.clone())]);
                }
                panic!("Expect RecordValue::{} for {}", type_name, key);
            }
        }
        panic!("Unexpected");
    }

    fn scalar(&self, key: &String) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(v) => match v {
                    RecordValue::Scalar(v) => Some(*v),
                    _ => panic!("Expect RecordValue::Scalar for {}", key),
                },
                None => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_slice(&[(format!("{}", key), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let value = self.find(key);
            let r = match value {
                RecordValue::DateTime(..) => self.latest(
                    key,
                    |v| matches!(v, RecordValue::DateTime(..)),
                    "DateTime",
                ),
                RecordValue::Array1(..) => {
                    self.latest(key, |v| matches!(v, RecordValue::Array1(..)), "Array1")
                }
                RecordValue::String(..) => {
                    self.latest(key, |v| matches!(v, RecordValue::String(..)), "String")
                }
                RecordValue::Scalar(..) => self.scalar(key),
            };
            record = record.merge(r);
        }

        self.data = vec![];

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_scalars_into_stats() {
        let mut storage = RecordStorage::new();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            storage.store(Record::from_scalar("loss", v));
        }

        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(agg.get_scalar("loss_max").unwrap(), 4.0);
        assert_eq!(agg.get_scalar("loss_mean").unwrap(), 2.5);
        assert_eq!(agg.get_scalar("loss_median").unwrap(), 3.0);

        // storage is cleared on aggregate
        storage.store(Record::from_scalar("loss", 7.0));
        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("loss").unwrap(), 7.0);
    }
}
