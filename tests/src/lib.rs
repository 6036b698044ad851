//! Cross-crate scenarios run against the in-memory store and scripted ports.

#[cfg(test)]
mod harness;

#[cfg(test)]
mod classification;

#[cfg(test)]
mod concurrency;
