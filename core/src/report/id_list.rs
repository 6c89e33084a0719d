use serde::{Deserialize, Serialize};

/// Sorted, duplicate-free list of node IDs. Decoding normalises the wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IdList(Vec<String>);

impl IdList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>) {
        let id = id.into();
        if let Err(pos) = self.0.binary_search(&id) {
            self.0.insert(pos, id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0
            .binary_search_by(|entry| entry.as_str().cmp(id))
            .is_ok()
    }

    pub fn merge(&mut self, other: &IdList) {
        if other.0.is_empty() {
            return;
        }
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut left, mut right) = (self.0.iter().peekable(), other.0.iter().peekable());
        loop {
            match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => match l.cmp(r) {
                    std::cmp::Ordering::Less => merged.extend(left.next().cloned()),
                    std::cmp::Ordering::Greater => merged.extend(right.next().cloned()),
                    std::cmp::Ordering::Equal => {
                        merged.extend(left.next().cloned());
                        right.next();
                    }
                },
                (Some(_), None) => merged.extend(left.by_ref().cloned()),
                (None, Some(_)) => merged.extend(right.by_ref().cloned()),
                (None, None) => break,
            }
        }
        self.0 = merged;
    }

    pub fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.0.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IdList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids: Vec<String> = iter.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }
}

impl From<Vec<String>> for IdList {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<IdList> for Vec<String> {
    fn from(ids: IdList) -> Self {
        ids.0
    }
}
