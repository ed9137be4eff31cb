/// The state of an entity before and after an update or write event.
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

impl<T> Change<T> {
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }

    /// Applies `f` to both sides.
    pub fn map<U, F>(self, mut f: F) -> Change<U>
    where
        F: FnMut(T) -> U,
    {
        Change {
            before: f(self.before),
            after: f(self.after),
        }
    }

    pub fn as_ref(&self) -> Change<&T> {
        Change {
            before: &self.before,
            after: &self.after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_applies_to_both_sides() {
        let change = Change::new(1, 2).map(|n| n * 10);
        assert_eq!(change, Change::new(10, 20));
    }

    #[test]
    fn test_as_ref() {
        let change = Change::new("a".to_string(), "b".to_string());
        let lengths = change.as_ref().map(|s| s.len());
        assert_eq!(lengths.before, 1);
        assert_eq!(change.after, "b");
    }
}
