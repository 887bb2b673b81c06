use crate::models::StudentRecord;
use crate::utils::contains_ignore_case;

/// Transient filter input of the share viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
}

impl FilterState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Records whose email contains `query`, ignoring case, in their original
/// order. An empty query keeps every record.
pub fn filter_by_email<'a>(records: &'a [StudentRecord], query: &str) -> Vec<&'a StudentRecord> {
    if query.is_empty() {
        return records.iter().collect();
    }

    let query = query.to_lowercase();
    records
        .iter()
        .filter(|r| contains_ignore_case(&r.email, &query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(roll_no: &str, email: &str) -> StudentRecord {
        StudentRecord {
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            email: email.to_string(),
            roll_no: roll_no.to_string(),
        }
    }

    fn roll_nos(records: &[&StudentRecord]) -> Vec<String> {
        records.iter().map(|r| r.roll_no.clone()).collect()
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let records = vec![record("3", "c@z.com"), record("1", "a@x.com"), record("2", "b@y.com")];
        let filtered = filter_by_email(&records, "");
        assert_eq!(roll_nos(&filtered), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_single_letter_filter() {
        let records = vec![record("1", "A@x.com"), record("2", "b@y.com")];
        let filtered = filter_by_email(&records, "a");
        assert_eq!(roll_nos(&filtered), vec!["1"]);
    }

    #[test]
    fn test_mixed_case_query_and_email() {
        let records = vec![
            record("1", "Priya.Sharma@College.EDU"),
            record("2", "rahul@college.edu"),
            record("3", "someone@else.org"),
        ];
        assert_eq!(roll_nos(&filter_by_email(&records, "COLLEGE.edu")), vec!["1", "2"]);
        assert_eq!(roll_nos(&filter_by_email(&records, "pRiYa")), vec!["1"]);
    }

    #[test]
    fn test_no_match_and_empty_input() {
        let records = vec![record("1", "a@x.com")];
        assert!(filter_by_email(&records, "zzz").is_empty());
        assert!(filter_by_email(&[], "a").is_empty());
    }

    #[test]
    fn test_only_email_is_matched() {
        let mut r = record("1", "x@y.com");
        r.first_name = "Alice".to_string();
        let records = vec![r];
        assert!(filter_by_email(&records, "alice").is_empty());
    }
}
