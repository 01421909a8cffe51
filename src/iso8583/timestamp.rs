//! Wall-clock formatting helpers for the date/time fields (7, 12, 13, 15,
//! 17). The codec itself never consults the clock.

use chrono::Local;

pub fn yymmddhhmmss() -> String {
    Local::now().format("%y%m%d%H%M%S").to_string()
}

pub fn mmddhhmmss() -> String {
    Local::now().format("%m%d%H%M%S").to_string()
}

pub fn yymmdd() -> String {
    Local::now().format("%y%m%d").to_string()
}

pub fn mmdd() -> String {
    Local::now().format("%m%d").to_string()
}

pub fn hhmmss() -> String {
    Local::now().format("%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(yymmddhhmmss().len(), 12);
        assert_eq!(mmddhhmmss().len(), 10);
        assert_eq!(yymmdd().len(), 6);
        assert_eq!(mmdd().len(), 4);
        assert_eq!(hhmmss().len(), 6);
        assert!(hhmmss().chars().all(|c| c.is_ascii_digit()));
    }
}
