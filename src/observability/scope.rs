//! Begin/complete logging around a unit of work

use std::time::Instant;

use super::logger::Logger;

/// Logs `{name}_BEGIN` on creation and `{name}_COMPLETE` on [`complete`].
///
/// A scope dropped without completing logs `{name}_ERROR`.
///
/// [`complete`]: ObservationScope::complete
pub struct ObservationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    completed: bool,
}

impl ObservationScope {
    /// Open a scope without fields
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, Vec::new())
    }

    /// Open a scope whose fields are repeated on every line it logs
    pub fn with_fields(name: &'static str, fields: Vec<(&'static str, String)>) -> Self {
        Logger::info(&format!("{}_BEGIN", name), &borrow_fields(&fields));

        Self {
            name,
            fields,
            started: Instant::now(),
            completed: false,
        }
    }

    /// Milliseconds since the scope was opened
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Close the scope successfully, adding `extra` fields and the elapsed time
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.completed = true;

        let elapsed = self.elapsed_ms().to_string();
        let mut fields = borrow_fields(&self.fields);
        fields.extend_from_slice(extra);
        fields.push(("elapsed_ms", elapsed.as_str()));

        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Close the scope as failed
    pub fn fail(mut self, reason: &str) {
        self.completed = true;

        let mut fields = borrow_fields(&self.fields);
        fields.push(("reason", reason));

        Logger::error(&format!("{}_ERROR", self.name), &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            let mut fields = borrow_fields(&self.fields);
            fields.push(("reason", "dropped before completion"));
            Logger::error(&format!("{}_ERROR", self.name), &fields);
        }
    }
}

fn borrow_fields<'a>(fields: &'a [(&'static str, String)]) -> Vec<(&'a str, &'a str)> {
    fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::with_fields("TEST", vec![("query", "t:elf".to_string())]);
        scope.complete(&[("count", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST");
        scope.fail("no data");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        assert!(scope.elapsed_ms() < 60_000);
        drop(scope);
    }
}
