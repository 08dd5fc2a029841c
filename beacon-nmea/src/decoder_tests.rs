#[cfg(test)]
mod tests {
    use crate::NmeaDecoder;

    fn sentence(body: &str) -> String {
        let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);
        format!("${}*{:02X}\r\n", body, checksum)
    }

    /// Feed a whole string, returning how many sentences were committed
    fn feed(decoder: &mut NmeaDecoder, text: &str) -> usize {
        text.bytes().filter(|&b| decoder.encode(b)).count()
    }

    const GGA_FIX: &str = "GPGGA,120000.00,4500.0000,N,00900.0000,E,1,08,1.2,100.00,M,47.0,M,,";
    const RMC_FIX: &str = "GNRMC,120000.00,A,4500.0000,N,00900.0000,E,0.52,84.3,150624,,,A";
    const RMC_VOID: &str = "GNRMC,120001.00,V,,,,,,,150624,,,N";
    const GGA_VOID: &str = "GPGGA,120002.00,,,,,0,03,25.5,,,,,,";

    #[test]
    fn test_gga_fix() {
        let mut decoder = NmeaDecoder::new();
        assert_eq!(feed(&mut decoder, &sentence(GGA_FIX)), 1);

        let fix = decoder.fix();
        assert!(fix.has_fix());
        assert_eq!(fix.location.value(), Some((45.0, 9.0)));
        assert_eq!(fix.altitude.value(), Some(100.0));
        assert_eq!(fix.satellites.value(), Some(8));
        assert_eq!(fix.hdop.value(), Some(1.2));
        assert_eq!(fix.time.value(), Some(12 * 3_600_000));

        let stats = decoder.stats();
        assert_eq!(stats.passed_checksum, 1);
        assert_eq!(stats.failed_checksum, 0);
        assert_eq!(stats.sentences_with_fix, 1);
        assert_eq!(stats.chars_processed as usize, sentence(GGA_FIX).len());
    }

    #[test]
    fn test_rmc_fix_and_timestamp() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, &sentence(RMC_FIX));

        let fix = decoder.fix();
        assert_eq!(fix.location.value(), Some((45.0, 9.0)));
        assert_eq!(fix.speed.value(), Some(0.52));
        assert_eq!(fix.course.value(), Some(84.3));
        // RMC carries no altitude
        assert_eq!(fix.altitude.value(), None);

        // 2024-06-15 is 19889 days after the epoch
        assert_eq!(
            fix.utc_timestamp_ms(),
            Some(19_889 * 86_400_000 + 12 * 3_600_000)
        );
    }

    #[test]
    fn test_bad_checksum_is_not_committed() {
        let mut decoder = NmeaDecoder::new();
        let mut bad = sentence(GGA_FIX);
        // corrupt the satellite count, leave the checksum alone
        bad = bad.replace(",08,", ",09,");

        assert_eq!(feed(&mut decoder, &bad), 0);
        assert!(!decoder.fix().has_fix());
        assert_eq!(decoder.fix().satellites.value(), None);
        assert_eq!(decoder.stats().failed_checksum, 1);
    }

    #[test]
    fn test_missing_checksum_is_rejected() {
        let mut decoder = NmeaDecoder::new();
        let text = format!("${}\r\n", GGA_FIX);

        assert_eq!(feed(&mut decoder, &text), 0);
        assert_eq!(decoder.stats().failed_checksum, 1);
        assert!(!decoder.fix().has_fix());
    }

    #[test]
    fn test_lost_fix_invalidates_location() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, &sentence(GGA_FIX));
        assert!(decoder.fix_mut().take_location_updated());
        assert!(!decoder.fix_mut().take_location_updated());

        feed(&mut decoder, &sentence(RMC_VOID));
        assert!(!decoder.fix().has_fix());
        // losing the fix is reported once
        assert!(decoder.fix_mut().take_location_updated());

        feed(&mut decoder, &sentence(GGA_VOID));
        assert!(!decoder.fix_mut().take_location_updated());
        assert_eq!(decoder.fix().altitude.value(), None);
        // satellites and hdop are still reported without a fix
        assert_eq!(decoder.fix().satellites.value(), Some(3));
        assert_eq!(decoder.fix().hdop.value(), Some(25.5));
    }

    #[test]
    fn test_southern_western_hemisphere() {
        let mut decoder = NmeaDecoder::new();
        feed(
            &mut decoder,
            &sentence("GPGGA,010203,3352.1200,S,15112.6000,W,2,11,0.8,12.5,M,,M,,"),
        );

        let (lat, lon) = decoder.fix().location.value().unwrap();
        assert!((lat + 33.868666).abs() < 1e-6);
        assert!((lon + 151.21).abs() < 1e-6);
    }

    #[test]
    fn test_other_sentences_are_ignored() {
        let mut decoder = NmeaDecoder::new();
        let text = sentence("GPGSV,3,1,11,03,03,111,00,04,15,270,00,06,01,010,00,13,06,292,00");

        assert_eq!(feed(&mut decoder, &text), 0);
        assert_eq!(decoder.stats().passed_checksum, 1);
        assert_eq!(*decoder.fix(), Default::default());
    }

    #[test]
    fn test_noise_and_partial_sentences() {
        let mut decoder = NmeaDecoder::new();

        // garbage, a sentence cut short by a new '$', then a good sentence
        let text = format!("\x00\x7fjunk\r\n$GPGGA,1200{}", sentence(GGA_FIX));
        assert_eq!(feed(&mut decoder, &text), 1);
        assert!(decoder.fix().has_fix());
        assert_eq!(decoder.stats().failed_checksum, 0);
    }

    #[test]
    fn test_overflow_drops_sentence() {
        let mut decoder = NmeaDecoder::new();
        let long = format!("$GPGGA,{}\r\n", "9".repeat(200));

        assert_eq!(feed(&mut decoder, &long), 0);
        assert_eq!(decoder.stats().overflowed, 1);

        // decoder recovers on the next sentence
        assert_eq!(feed(&mut decoder, &sentence(GGA_FIX)), 1);
    }

    #[test]
    fn test_void_rmc_clears_stale_altitude() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, &sentence(GGA_FIX));
        assert_eq!(decoder.fix().altitude.value(), Some(100.0));

        feed(&mut decoder, &sentence(RMC_VOID));
        feed(
            &mut decoder,
            &sentence("GNRMC,120005.00,A,4600.0000,N,01000.0000,E,0.10,12.0,150624,,,A"),
        );

        // the new position must not carry the altitude of the old one
        assert_eq!(decoder.fix().location.value(), Some((46.0, 10.0)));
        assert_eq!(decoder.fix().altitude.value(), None);
    }

    #[test]
    fn test_unknown_talker_is_ignored() {
        let mut decoder = NmeaDecoder::new();
        let text = format!(
            "{}{}",
            sentence("PXRMC,120000.00,A,4500.0000,N,00900.0000,E,0.52,84.3,150624,,,A"),
            sentence("BDGGA,120000.00,4500.0000,N,00900.0000,E,1,08,1.2,100.00,M,47.0,M,,")
        );

        assert_eq!(feed(&mut decoder, &text), 0);
        assert_eq!(decoder.stats().passed_checksum, 2);
        assert_eq!(*decoder.fix(), Default::default());

        // GLONASS and Galileo talkers are accepted
        let text = format!(
            "{}{}",
            sentence("GLGGA,120000.00,4500.0000,N,00900.0000,E,1,08,1.2,100.00,M,47.0,M,,"),
            sentence("GARMC,120000.00,A,4500.0000,N,00900.0000,E,0.52,84.3,150624,,,A")
        );
        assert_eq!(feed(&mut decoder, &text), 2);
    }

    #[test]
    fn test_non_finite_fields_are_not_committed() {
        let mut decoder = NmeaDecoder::new();
        feed(
            &mut decoder,
            &sentence("GPGGA,120000.00,4500.0000,N,00900.0000,E,1,08,NaN,inf,M,47.0,M,,"),
        );

        let fix = decoder.fix();
        assert_eq!(fix.location.value(), Some((45.0, 9.0)));
        assert_eq!(fix.hdop.value(), None);
        assert_eq!(fix.altitude.value(), None);

        feed(
            &mut decoder,
            &sentence("GNRMC,120001.00,A,4500.0000,N,00900.0000,E,NaN,-inf,150624,,,A"),
        );
        assert_eq!(decoder.fix().speed.value(), None);
        assert_eq!(decoder.fix().course.value(), None);
    }
}
