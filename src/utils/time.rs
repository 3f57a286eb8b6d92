use chrono::NaiveDate;

const UNIX_EPOCH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(date) => date,
    None => unreachable!(),
};

/// Number of whole days since the Unix epoch. Day boundaries are compared
/// through this integer rather than through formatted date strings, which
/// keeps the comparison locale-independent.
pub fn epoch_day(date: NaiveDate) -> i64 {
    date.signed_duration_since(UNIX_EPOCH_DATE).num_days()
}

pub fn same_calendar_day(a: NaiveDate, b: NaiveDate) -> bool {
    epoch_day(a) == epoch_day(b)
}
