//! Response aggregation: folds flat response rows into one record per
//! respondent.
//!
//! Rows arrive grouped by respondent and question from the fetcher, but the
//! fold does not depend on that: respondents and questions are kept in
//! first-seen order whatever the input order is.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::api::{RespondentKey, RespondentRecord, ResponseRow};

/// Separator placed between repeated answers to the same question.
pub const ANSWER_SEPARATOR: &str = " ; ";

/// Merge response rows into per-respondent records.
///
/// Every row contributes to exactly one record. A repeated question appends
/// `" ; "` and the new answer; a missing answer contributes an empty segment.
/// Records are returned in the order their respondent key first appears.
pub fn aggregate_responses<I>(rows: I) -> Vec<RespondentRecord>
where
    I: IntoIterator<Item = ResponseRow>,
{
    let mut respondents: IndexMap<RespondentKey, RespondentRecord> = IndexMap::new();

    for row in rows {
        let record = respondents
            .entry(RespondentKey::for_row(&row))
            .or_insert_with(|| RespondentRecord::new(row.identity()));

        let answer = row.answer_text.unwrap_or_default();
        match record.answers.entry(row.question_text) {
            Entry::Occupied(mut existing) => {
                let merged = existing.get_mut();
                merged.push_str(ANSWER_SEPARATOR);
                merged.push_str(&answer);
            }
            Entry::Vacant(slot) => {
                slot.insert(answer);
            }
        }
    }

    respondents.into_values().collect()
}

#[cfg(test)]
#[path = "aggregation_tests.rs"]
mod aggregation_tests;
