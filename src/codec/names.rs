//! Name-hint pipeline feeding object-scope keys.

#[cfg(feature = "smallvec")]
use smallvec::SmallVec;

/// LIFO stack of pending field names plus the `valueN` fallback counter.
///
/// Every named submission pushes one hint (possibly empty) before the value
/// descends, and every leaf emission or scope attachment inside an object
/// consumes one. Array slots never consume hints. An empty or missing hint
/// yields a synthesized `valueN` key, with `N` monotonic per archive.
#[derive(Debug, Default)]
pub(crate) struct NameStack {
    #[cfg(feature = "smallvec")]
    hints: SmallVec<[String; 8]>,
    #[cfg(not(feature = "smallvec"))]
    hints: Vec<String>,
    counter: u64,
}

impl NameStack {
    pub(crate) fn push(&mut self, hint: &str) {
        self.hints.push(hint.to_owned());
    }

    /// Consumes the next pending name, synthesizing one when necessary.
    pub(crate) fn next(&mut self) -> String {
        match self.hints.pop() {
            Some(name) if !name.is_empty() => name,
            _ => {
                let name = format!("value{}", self.counter);
                self.counter += 1;
                name
            }
        }
    }
}
