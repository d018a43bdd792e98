use crate::types::error::{DatabaseError, Result};

/// Output of an operation that tolerates isolated failures: everything that
/// decoded, plus the errors for the pieces that did not.
#[derive(Debug)]
pub struct PartialResult<T> {
    pub results: Vec<T>,
    pub errors: Vec<DatabaseError>,
}

impl<T> PartialResult<T> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, result: Result<T>) {
        match result {
            Ok(value) => self.results.push(value),
            Err(e) => self.errors.push(e),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PartialResult<U> {
        PartialResult {
            results: self.results.into_iter().map(f).collect(),
            errors: self.errors,
        }
    }
}

impl<T> Default for PartialResult<T> {
    fn default() -> Self {
        Self::new()
    }
}
