use chrono::{Datelike, NaiveDate, Weekday};

const DAY_NAMES: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Which calendar dates a recurring item is eligible on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceRule {
    Daily,
    Weekdays,
    Weekends,
    /// One fixed day per week, anchored to the item's start weekday.
    Weekly,
    /// Eligible every day; completion is judged against the Mon–Sun week
    /// window instead of a single date.
    WeeklyFlexible,
    /// First occurrence of the weekday in each month.
    MonthlyOnWeekday(Weekday),
    WeekdaySet(Vec<Weekday>),
}

impl RecurrenceRule {
    /// Parses stored rule text, case-insensitive and trimmed. Returns `None`
    /// for anything outside the grammar; such rules match no dates.
    pub fn parse(input: &str) -> Option<Self> {
        let lower = input.trim().to_ascii_lowercase();
        match lower.as_str() {
            "daily" => Some(Self::Daily),
            "weekdays" => Some(Self::Weekdays),
            "weekends" => Some(Self::Weekends),
            "weekly" => Some(Self::Weekly),
            "weekly-flexible" => Some(Self::WeeklyFlexible),
            _ => {
                if let Some(day_name) = lower.strip_prefix("monthly-") {
                    return parse_weekday(day_name).map(Self::MonthlyOnWeekday);
                }
                let days: Vec<Weekday> = lower.split(',').filter_map(parse_weekday).collect();
                if days.is_empty() {
                    None
                } else {
                    Some(Self::WeekdaySet(days))
                }
            }
        }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Self::Daily | Self::WeeklyFlexible => true,
            Self::Weekdays => date.weekday().number_from_monday() <= 5,
            Self::Weekends => matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            // Meaningful only with a start-date anchor; see `matches_anchored`.
            Self::Weekly => false,
            Self::MonthlyOnWeekday(day) => first_weekday_of_month(date, *day) == Some(date),
            Self::WeekdaySet(days) => days.contains(&date.weekday()),
        }
    }

    /// Like `matches`, with `Weekly` firing on the anchor weekday.
    pub fn matches_anchored(&self, date: NaiveDate, anchor: Weekday) -> bool {
        match self {
            Self::Weekly => date.weekday() == anchor,
            _ => self.matches(date),
        }
    }
}

/// Evaluates stored rule text for one calendar date. A missing or blank rule
/// places no restriction on the date; unrecognized text matches nothing and
/// is logged, since the item silently drops out of day views.
pub fn rule_matches(rule: Option<&str>, date: NaiveDate) -> bool {
    match parse_or_warn(rule) {
        RuleText::Absent => true,
        RuleText::Unrecognized => false,
        RuleText::Parsed(parsed) => parsed.matches(date),
    }
}

/// `rule_matches` with a start-weekday anchor for `weekly` rules.
pub fn rule_matches_anchored(rule: Option<&str>, date: NaiveDate, anchor: Weekday) -> bool {
    match parse_or_warn(rule) {
        RuleText::Absent => true,
        RuleText::Unrecognized => false,
        RuleText::Parsed(parsed) => parsed.matches_anchored(date, anchor),
    }
}

enum RuleText {
    Absent,
    Unrecognized,
    Parsed(RecurrenceRule),
}

fn parse_or_warn(rule: Option<&str>) -> RuleText {
    let Some(raw) = rule else {
        return RuleText::Absent;
    };
    if raw.trim().is_empty() {
        return RuleText::Absent;
    }
    match RecurrenceRule::parse(raw) {
        Some(parsed) => RuleText::Parsed(parsed),
        None => {
            tracing::warn!(rule = raw, "unrecognized recurrence rule matches no dates");
            RuleText::Unrecognized
        }
    }
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    let token = token.trim();
    DAY_NAMES
        .iter()
        .find(|(name, _)| token.eq_ignore_ascii_case(name))
        .map(|(_, day)| *day)
}

fn first_weekday_of_month(date: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let mut cursor = date.with_day(1)?;
    while cursor.weekday() != day {
        cursor = cursor.succ_opt()?;
    }
    Some(cursor)
}
