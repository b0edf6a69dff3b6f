//! Cross-crate integration tests.

#[cfg(test)]
mod harness;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
