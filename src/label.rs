//! Return labels
//!
//! Every call site defines a label right after its indirect branch, which is where the callee
//! returns to. Labels are numbered by expansion order so that several calls within the same
//! compilation unit never define the same symbol twice.

use std::fmt;

/// The return label of one call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(usize);

impl Label {
    pub const PREFIX: &'static str = "ret_";

    pub fn new(id: usize) -> Self {
        Label(id)
    }

    /// The expansion-order counter value of this label.
    pub fn id(self) -> usize {
        self.0
    }
}

/// Labels print as their symbolic name, `ret_<id>`.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

/// Hands out fresh labels for one compilation unit.
///
/// Labels are unique within a generator and nothing more: two generators starting from the same
/// value produce the same names.
#[derive(Debug, Default, Clone)]
pub struct LabelGenerator {
    next: usize,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose first label is `ret_<first>`.
    pub fn starting_at(first: usize) -> Self {
        LabelGenerator { next: first }
    }

    pub fn next_label(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        log::trace!("Allocated return label {label}");
        label
    }

    /// The id the next label will get.
    pub fn peek(&self) -> usize {
        self.next
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn label_names() {
        assert_eq!(Label::new(0).to_string(), "ret_0");
        assert_eq!(Label::new(42).to_string(), "ret_42");
        assert_eq!(Label::new(7).id(), 7);
    }

    #[test]
    fn sequential_labels() {
        let mut labels = LabelGenerator::new();
        assert_eq!(labels.next_label(), Label::new(0));
        assert_eq!(labels.next_label(), Label::new(1));
        assert_eq!(labels.peek(), 2);

        let mut labels = LabelGenerator::starting_at(10);
        assert_eq!(labels.next_label().to_string(), "ret_10");
        assert_eq!(labels.next_label().to_string(), "ret_11");
    }

    #[test]
    fn labels_are_unique() {
        let mut labels = LabelGenerator::new();
        let names: HashSet<String> = (0..1000).map(|_| labels.next_label().to_string()).collect();
        assert_eq!(names.len(), 1000);
    }
}
