use heapless::Vec;

use crate::fix::FixSnapshot;
use crate::parse::{
    checksum, parse_coordinate, parse_date, parse_finite, parse_hex_byte, parse_time,
};

/// NMEA 0183 caps sentences at 82 characters, leave some room for chatty receivers
pub const MAX_SENTENCE_LEN: usize = 96;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DecoderStats {
    pub chars_processed: u32,
    pub passed_checksum: u32,
    pub failed_checksum: u32,
    pub sentences_with_fix: u32,
    pub overflowed: u32,
}

/// Byte at a time decoder for GGA and RMC sentences.
///
/// Only sentences with a correct checksum are committed to the snapshot.
#[derive(Default)]
pub struct NmeaDecoder {
    sentence: Vec<u8, MAX_SENTENCE_LEN>,
    in_sentence: bool,
    fix: FixSnapshot,
    stats: DecoderStats,
}

enum Sentence {
    Gga,
    Rmc,
    Other,
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix(&self) -> &FixSnapshot {
        &self.fix
    }

    pub fn fix_mut(&mut self) -> &mut FixSnapshot {
        &mut self.fix
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Feed one byte. Returns true when it completed a GGA or RMC sentence
    /// that was committed to the snapshot.
    pub fn encode(&mut self, byte: u8) -> bool {
        self.stats.chars_processed = self.stats.chars_processed.wrapping_add(1);

        match byte {
            b'$' => {
                self.sentence.clear();
                self.in_sentence = true;
                false
            }
            b'\r' | b'\n' => {
                if !self.in_sentence {
                    return false;
                }
                self.in_sentence = false;
                self.finish_sentence()
            }
            _ => {
                if self.in_sentence && self.sentence.push(byte).is_err() {
                    log::debug!("NMEA sentence overflow, dropping");
                    self.stats.overflowed += 1;
                    self.in_sentence = false;
                }
                false
            }
        }
    }

    fn finish_sentence(&mut self) -> bool {
        let sentence = core::mem::take(&mut self.sentence);

        let Some(star) = sentence.iter().rposition(|&b| b == b'*') else {
            self.stats.failed_checksum += 1;
            return false;
        };
        let (body, expected) = (&sentence[..star], parse_hex_byte(&sentence[star + 1..]));
        if expected != Some(checksum(body)) {
            log::debug!("NMEA checksum mismatch");
            self.stats.failed_checksum += 1;
            return false;
        }
        self.stats.passed_checksum += 1;

        let Ok(body) = core::str::from_utf8(body) else {
            return false;
        };
        let mut fields = body.split(',');
        let sentence_type = match fields.next() {
            Some(id) if id.len() == 5 && id.is_ascii() => match (&id[..2], &id[2..]) {
                ("GP" | "GN" | "GL" | "GA", "GGA") => Sentence::Gga,
                ("GP" | "GN" | "GL" | "GA", "RMC") => Sentence::Rmc,
                _ => Sentence::Other,
            },
            _ => Sentence::Other,
        };

        // pad missing trailing fields with empties so indexing below is total
        let mut tokens: [&str; 13] = [""; 13];
        for (slot, token) in tokens.iter_mut().zip(fields) {
            *slot = token;
        }

        match sentence_type {
            Sentence::Gga => {
                self.commit_gga(&tokens);
                true
            }
            Sentence::Rmc => {
                self.commit_rmc(&tokens);
                true
            }
            Sentence::Other => false,
        }
    }

    // time, lat, N/S, lon, E/W, quality, sats, hdop, altitude, M, ...
    fn commit_gga(&mut self, t: &[&str; 13]) {
        let has_fix = matches!(t[5].parse::<u8>(), Ok(q) if q > 0);

        if let Some(time) = parse_time(t[0]) {
            self.fix.time.commit(time);
        }
        if let Ok(sats) = t[6].parse::<u32>() {
            self.fix.satellites.commit(sats);
        }
        if let Some(hdop) = parse_finite(t[7]) {
            self.fix.hdop.commit(hdop);
        }

        if has_fix {
            self.stats.sentences_with_fix += 1;
            self.commit_location(t[1], t[2], t[3], t[4]);
            match parse_finite(t[8]) {
                Some(altitude) => self.fix.altitude.commit(altitude),
                None => self.fix.altitude.invalidate(),
            }
        } else {
            self.fix.location.invalidate();
            self.fix.altitude.invalidate();
        }
    }

    // time, status, lat, N/S, lon, E/W, speed, course, date, mag var, E/W, mode
    fn commit_rmc(&mut self, t: &[&str; 13]) {
        let has_fix = t[1] == "A";

        if let Some(time) = parse_time(t[0]) {
            self.fix.time.commit(time);
        }
        if let Some(date) = parse_date(t[8]) {
            self.fix.date.commit(date);
        }

        if has_fix {
            self.stats.sentences_with_fix += 1;
            self.commit_location(t[2], t[3], t[4], t[5]);
            if let Some(speed) = parse_finite(t[6]) {
                self.fix.speed.commit(speed);
            }
            if let Some(course) = parse_finite(t[7]) {
                self.fix.course.commit(course);
            }
        } else {
            self.fix.location.invalidate();
            self.fix.altitude.invalidate();
            self.fix.speed.invalidate();
            self.fix.course.invalidate();
        }
    }

    fn commit_location(&mut self, lat: &str, ns: &str, lon: &str, ew: &str) {
        match (parse_coordinate(lat, ns), parse_coordinate(lon, ew)) {
            (Some(lat), Some(lon)) => self.fix.location.commit((lat, lon)),
            _ => self.fix.location.invalidate(),
        }
    }
}
