use serde::Serialize;

/// A value together with its serialized JSON form.
///
/// Replacing the value is skipped when the new one serializes to the same JSON,
/// so callers can tell whether a fetch actually changed anything.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    value: T,
    json: String,
}

fn fingerprint<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

impl<T: Serialize> Tracked<T> {
    pub fn new(value: T) -> Self {
        let json = fingerprint(&value);
        Self { value, json }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value when it differs structurally; returns whether it changed.
    pub fn update(&mut self, next: T) -> bool {
        let json = fingerprint(&next);
        if json == self.json {
            return false;
        }
        self.value = next;
        self.json = json;
        true
    }
}

impl<T: Serialize + Default> Default for Tracked<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_json_is_not_a_change() {
        let mut tracked = Tracked::new(vec![1, 2, 3]);
        assert!(!tracked.update(vec![1, 2, 3]));
        assert!(tracked.update(vec![1, 2]));
        assert_eq!(tracked.get(), &vec![1, 2]);
        assert!(!tracked.update(vec![1, 2]));
    }

    #[test]
    fn order_matters() {
        let mut tracked = Tracked::new(vec!["a", "b"]);
        assert!(tracked.update(vec!["b", "a"]));
    }
}
