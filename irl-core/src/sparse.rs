use std::{
    collections::{HashMap, hash_map},
    hash::Hash,
};

/// State values for state spaces too large or too irregular for a tensor.
///
/// Reading a state that was never written yields `0.0` without storing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct StateValues<K: Eq + Hash> {
    values: HashMap<K, f64>,
}

impl<K: Eq + Hash> Default for StateValues<K> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> StateValues<K> {
    pub fn peek(&self, key: &K) -> f64 {
        self.values.get(key).copied().unwrap_or_default()
    }

    /// Mutable access, inserting `0.0` first if the key is new.
    pub fn value_mut(&mut self, key: K) -> &mut f64 {
        self.values.entry(key).or_default()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }
}

impl<K: Eq + Hash> FromIterator<(K, f64)> for StateValues<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<K: Eq + Hash> IntoIterator for StateValues<K> {
    type Item = (K, f64);
    type IntoIter = hash_map::IntoIter<K, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Two level map, e.g. action values keyed by state then action. Absent entries read as `0.0`.
#[derive(Debug, Clone)]
pub struct SparseMatrix<O: Eq + Hash, I: Eq + Hash> {
    rows: HashMap<O, HashMap<I, f64>>,
}

impl<O: Eq + Hash, I: Eq + Hash> Default for SparseMatrix<O, I> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<O: Eq + Hash, I: Eq + Hash> SparseMatrix<O, I> {
    pub fn peek(&self, outer: &O, inner: &I) -> f64 {
        self.rows
            .get(outer)
            .and_then(|row| row.get(inner))
            .copied()
            .unwrap_or_default()
    }

    pub fn value_mut(&mut self, outer: O, inner: I) -> &mut f64 {
        self.rows.entry(outer).or_default().entry(inner).or_default()
    }

    pub fn contains(&self, outer: &O) -> bool {
        self.rows.contains_key(outer)
    }

    pub fn row(&self, outer: &O) -> Option<&HashMap<I, f64>> {
        self.rows.get(outer)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
