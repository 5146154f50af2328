//! MCP Tools
//!
//! Tool implementations for the Larder MCP server.

use chrono::NaiveDate;

pub mod planner;
pub mod status;
pub mod storage;

/// Parse an ISO date (YYYY-MM-DD)
pub fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD", date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(" 2026-10-19 "), Ok(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("10/19/2026").is_err());
    }
}
