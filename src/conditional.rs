// Copyright 2025 Cowboy AI, LLC.

//! Outcome of an attempt that may legitimately find nothing to do

/// The outcome of a conditional invocation
///
/// `Successful` carries the produced value; `Unsuccessful` means no handler
/// ran to completion. Neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum ConditionalValue<T = ()> {
    /// A handler ran and produced a value
    Successful(T),
    /// Nothing was invoked, or the invocation did not complete
    Unsuccessful,
}

impl<T> ConditionalValue<T> {
    /// Check whether the invocation succeeded
    pub fn succeeded(&self) -> bool {
        matches!(self, ConditionalValue::Successful(_))
    }

    /// Borrow the produced value
    pub fn result(&self) -> Option<&T> {
        match self {
            ConditionalValue::Successful(value) => Some(value),
            ConditionalValue::Unsuccessful => None,
        }
    }

    /// Take the produced value
    pub fn into_result(self) -> Option<T> {
        self.into()
    }

    /// Map the produced value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ConditionalValue<U> {
        match self {
            ConditionalValue::Successful(value) => ConditionalValue::Successful(f(value)),
            ConditionalValue::Unsuccessful => ConditionalValue::Unsuccessful,
        }
    }
}

impl ConditionalValue {
    /// Build a unit outcome from a success flag
    pub fn from_flag(succeeded: bool) -> Self {
        if succeeded {
            ConditionalValue::Successful(())
        } else {
            ConditionalValue::Unsuccessful
        }
    }
}

impl<T> Default for ConditionalValue<T> {
    fn default() -> Self {
        ConditionalValue::Unsuccessful
    }
}

impl<T> From<Option<T>> for ConditionalValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(ConditionalValue::Unsuccessful, ConditionalValue::Successful)
    }
}

impl<T> From<ConditionalValue<T>> for Option<T> {
    fn from(value: ConditionalValue<T>) -> Self {
        match value {
            ConditionalValue::Successful(value) => Some(value),
            ConditionalValue::Unsuccessful => None,
        }
    }
}
