//! `EFI_TIME` encoding
//!
//! ```text
//! Year (u16) | Month | Day | Hour | Minute | Second | Pad1
//! Nanosecond (u32) | TimeZone (i16) | Daylight | Pad2
//! ```
//!
//! All multi-byte fields are little-endian; the structure is 16 bytes.

use chrono::{Datelike, NaiveDateTime, Timelike};

use super::constants::EFI_TIME_SIZE;
use crate::{Error, Result};

/// Timestamp used for `EFI_VARIABLE_APPEND_WRITE` updates: all fields zero.
pub const EFI_TIME_APPEND: [u8; EFI_TIME_SIZE] = [0; EFI_TIME_SIZE];

/// Encode `time` as an `EFI_TIME` structure.
///
/// With `append` set the all-zero [`EFI_TIME_APPEND`] sentinel is returned
/// and the other arguments are ignored. Authenticated variables must carry
/// a zero `Nanosecond` field, so `authenticated` drops the sub-second part;
/// otherwise it is kept at microsecond granularity. `TimeZone` and
/// `Daylight` are always zero.
///
/// # Errors
///
/// Returns [`Error::Format`] if the year does not fit in 16 bits.
pub fn encode_efi_time(
    time: &NaiveDateTime,
    authenticated: bool,
    append: bool,
) -> Result<[u8; EFI_TIME_SIZE]> {
    if append {
        return Ok(EFI_TIME_APPEND);
    }

    let year = u16::try_from(time.year())
        .map_err(|_| Error::Format(format!("Year {} does not fit in EFI_TIME", time.year())))?;

    let nanosecond = if authenticated {
        0
    } else {
        // chrono reports leap seconds as nanosecond >= 1_000_000_000
        (time.nanosecond() % 1_000_000_000) / 1_000 * 1_000
    };

    let mut buf = [0u8; EFI_TIME_SIZE];
    buf[0..2].copy_from_slice(&year.to_le_bytes());
    buf[2] = time.month() as u8;
    buf[3] = time.day() as u8;
    buf[4] = time.hour() as u8;
    buf[5] = time.minute() as u8;
    buf[6] = time.second() as u8;
    // buf[7]: Pad1
    buf[8..12].copy_from_slice(&nanosecond.to_le_bytes());
    // buf[12..14]: TimeZone, buf[14]: Daylight, buf[15]: Pad2
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_micro_opt(13, 45, 30, 123_456)
            .unwrap()
    }

    #[test]
    fn test_encode_authenticated_time() {
        let bytes = encode_efi_time(&sample_time(), true, false).unwrap();
        assert_eq!(
            bytes,
            [0xe8, 0x07, 3, 15, 13, 45, 30, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_encode_time_keeps_nanoseconds_outside_authvar() {
        let bytes = encode_efi_time(&sample_time(), false, false).unwrap();
        assert_eq!(&bytes[8..12], &123_456_000u32.to_le_bytes());
        assert_eq!(&bytes[12..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_append_sentinel() {
        for authenticated in [true, false] {
            let bytes = encode_efi_time(&sample_time(), authenticated, true).unwrap();
            assert_eq!(bytes, [0u8; 16]);
        }
    }

    #[test]
    fn test_encode_append_ignores_unrepresentable_year() {
        let time = NaiveDate::from_ymd_opt(-5, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(encode_efi_time(&time, true, true).unwrap(), EFI_TIME_APPEND);
    }

    #[test]
    fn test_encode_negative_year_rejected() {
        let time = NaiveDate::from_ymd_opt(-5, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let result = encode_efi_time(&time, true, false);
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
