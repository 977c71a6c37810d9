use std::collections::HashMap;

use roichart_core::{
    estimate_subject_centiles, CentileKind, ReferenceCentileTable, SubjectCentiles,
    SubjectMeasurements,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: CentileKind,
    age: u64,
    values: Vec<(String, u64)>,
}

impl CacheKey {
    fn new(kind: CentileKind, subject: &SubjectMeasurements) -> Self {
        Self {
            kind,
            age: subject.age.to_bits(),
            values: subject
                .values
                .iter()
                .map(|(roi, value)| (roi.clone(), value.to_bits()))
                .collect(),
        }
    }
}

/// Memoized subject centile estimates, keyed on reference kind, age and
/// measured values.
#[derive(Debug, Clone, Default)]
pub struct CentileCache {
    entries: HashMap<CacheKey, SubjectCentiles>,
}

impl CentileCache {
    /// Returns the cached estimate or computes and stores it.
    pub fn get_or_compute(
        &mut self,
        kind: CentileKind,
        table: &ReferenceCentileTable,
        subject: &SubjectMeasurements,
    ) -> SubjectCentiles {
        self.entries
            .entry(CacheKey::new(kind, subject))
            .or_insert_with(|| estimate_subject_centiles(table, subject))
            .clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Forgets the entries of one reference kind.
    pub fn invalidate(&mut self, kind: CentileKind) {
        self.entries.retain(|key, _| key.kind != kind);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
