pub(crate) fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc ^ b)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

pub(crate) fn parse_hex_byte(hex: &[u8]) -> Option<u8> {
    match hex {
        [hi, lo] => Some(hex_digit(*hi)? << 4 | hex_digit(*lo)?),
        _ => None,
    }
}

/// `hhmmss[.sss]` to milliseconds since midnight
pub(crate) fn parse_time(token: &str) -> Option<u32> {
    if token.len() < 6 || !token.is_char_boundary(6) {
        return None;
    }
    let hours = token[0..2].parse::<u32>().ok()?;
    let minutes = token[2..4].parse::<u32>().ok()?;
    let seconds = token[4..].parse::<f64>().ok()?;
    if hours > 23 || minutes > 59 || !(0.0..61.0).contains(&seconds) {
        return None;
    }

    Some(hours * 60 * 60_000 + minutes * 60_000 + (seconds * 1000.0 + 0.5) as u32)
}

/// `ddmmyy` to whole days since 1970-01-01
pub(crate) fn parse_date(token: &str) -> Option<u32> {
    if token.len() != 6 || !token.is_ascii() {
        return None;
    }
    let day = token[0..2].parse::<u32>().ok()?;
    let month = token[2..4].parse::<u32>().ok()?;
    let year = token[4..6].parse::<u32>().ok()?;
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    // two digit years from receivers that predate 2000 are not worth supporting
    days_from_civil(2000 + year, month, day)
}

// proleptic Gregorian, see http://howardhinnant.github.io/date_algorithms.html
fn days_from_civil(year: u32, month: u32, day: u32) -> Option<u32> {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    (era * 146_097 + doe).checked_sub(719_468)
}

/// Decimal field, `NaN` and `inf` are not readings
pub(crate) fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere to signed decimal degrees
pub(crate) fn parse_coordinate(token: &str, hemisphere: &str) -> Option<f64> {
    let dot = token.find('.').unwrap_or(token.len());
    if dot < 3 || !token.is_ascii() {
        return None;
    }
    let degrees = parse_finite(&token[..dot - 2])?;
    let minutes = parse_finite(&token[dot - 2..])?;
    if minutes >= 60.0 {
        return None;
    }

    let value = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(value),
        "S" | "W" => Some(-value),
        _ => None,
    }
}
