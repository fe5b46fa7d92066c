use thiserror::Error;

/// Errors returned when configuring a generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid code length {length}; expected {min}..={max}")]
    InvalidLength { length: usize, min: usize, max: usize },
}

/// Errors returned by [`allocate`](crate::allocate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError<E> {
    /// The existence oracle failed; the error is passed through untouched.
    #[error("existence check failed: {0}")]
    Oracle(E),
    /// Every candidate up to the attempt bound is bound to another URL.
    #[error("no free short code after {attempts} attempts")]
    Exhausted { attempts: u32 },
}
