//! Random blob names.

use rand::prelude::RngExt;
use rand::rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Produces candidate blob names; the caller checks them for collisions
pub trait NameGenerator: Send + Sync {
    /// A name of `length` random characters followed by `.{extension}`
    fn generate(&self, extension: &str, length: usize) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNameGenerator;

impl NameGenerator for RandomNameGenerator {
    fn generate(&self, extension: &str, length: usize) -> String {
        let mut rng = rng();
        let base: String = (0..length)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect();
        format!("{base}.{extension}")
    }
}

/// Swap the extension of a generated name, keeping everything before the first `.`
pub fn replace_extension(name: &str, extension: &str) -> String {
    let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
    format!("{stem}.{extension}")
}
