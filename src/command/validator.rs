//! Argument validators run by the dispatcher before a handler.

/// Checks an argument list, returning a user-facing message on failure.
pub trait ArgValidator: Send + Sync {
    /// `None` when `args` are acceptable.
    fn validate(&self, args: &[String]) -> Option<String>;
}

impl<F> ArgValidator for F
where
    F: Fn(&[String]) -> Option<String> + Send + Sync,
{
    fn validate(&self, args: &[String]) -> Option<String> {
        self(args)
    }
}

/// Bounds the number of arguments; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinMaxValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl MinMaxValidator {
    /// Validator accepting `min..=max` arguments.
    #[must_use]
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Exactly `count` arguments.
    #[must_use]
    pub fn exactly(count: usize) -> Self {
        Self::new(Some(count), Some(count))
    }

    /// Between `min` and `max` arguments, inclusive.
    #[must_use]
    pub fn between(min: usize, max: usize) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// At most `max` arguments.
    #[must_use]
    pub fn at_most(max: usize) -> Self {
        Self::new(None, Some(max))
    }
}

impl ArgValidator for MinMaxValidator {
    fn validate(&self, args: &[String]) -> Option<String> {
        let count = args.len();
        if let Some(min) = self.min.filter(|min| count < *min) {
            return Some(format!(
                "Too few arguments: expected at least {min}, got {count}."
            ));
        }
        if let Some(max) = self.max.filter(|max| count > *max) {
            return Some(format!(
                "Too many arguments: expected at most {max}, got {count}."
            ));
        }
        None
    }
}
