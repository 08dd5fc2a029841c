#![cfg_attr(not(test), no_std)]

mod decoder;
mod fix;
mod parse;

pub use decoder::{DecoderStats, NmeaDecoder, MAX_SENTENCE_LEN};
pub use fix::{Field, FixSnapshot};

#[cfg(test)]
mod decoder_tests;
