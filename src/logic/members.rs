use chrono::{DateTime, Utc};
use rand::Rng;

use crate::logic::{DynamicFilterSpec, FilterProvider};
use crate::model::{FilterDefinition, FilterOption, FullNameInformation, Member, NamingSchema};
use serde_json::Value;

pub const MEMBER_LIST_STORAGE_KEY: &str = "MemberList";
pub const MEETING_FILTER_PROPERTY: &str = "is_present_in_meeting_ids";
pub const COMMITTEE_FILTER_PROPERTY: &str = "committee_ids";

const PASSWORD_CHARACTERS: &str = "abcdefghijkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Filters of the organization member list
#[derive(Debug, Clone)]
pub struct MemberFilter {
    storage_key: String,
}

impl Default for MemberFilter {
    fn default() -> Self {
        Self::new(MEMBER_LIST_STORAGE_KEY)
    }
}

impl MemberFilter {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }
}

impl FilterProvider for MemberFilter {
    fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn filter_definitions(&self) -> Vec<FilterDefinition> {
        vec![
            FilterDefinition::boolean("is_active", "Active", "Is active", "Is not active"),
            FilterDefinition::boolean(
                "is_last_email_sent",
                "Last email sent",
                "Got an email",
                "Didn't get an email",
            ),
            FilterDefinition::new(
                "is_vote_weight_one",
                "Vote weight",
                vec![
                    FilterOption::new(Value::Bool(false), "Has changed vote weight"),
                    FilterOption::new(Value::Bool(true), "Has unchanged vote weight"),
                ],
            ),
            FilterDefinition::new(MEETING_FILTER_PROPERTY, "Meetings", vec![]),
            FilterDefinition::new(COMMITTEE_FILTER_PROPERTY, "Committees", vec![]),
        ]
    }

    fn dynamic_filters(&self) -> Vec<DynamicFilterSpec> {
        vec![
            DynamicFilterSpec::new(MEETING_FILTER_PROPERTY, "No meeting"),
            DynamicFilterSpec::new(COMMITTEE_FILTER_PROPERTY, "No committee"),
        ]
    }
}

/// Split a raw name into first and last name.
///
/// One or two parts fill first and last name; any other count puts the
/// whole input into the first name. The username is first + last name.
pub fn parse_user_string(input: &str, schema: NamingSchema) -> FullNameInformation {
    let parts: Vec<&str> = match schema {
        NamingSchema::FirstSpaceLast => input.split(' ').collect(),
        NamingSchema::LastCommaFirst => input.split(',').rev().collect(),
    };

    let mut user = FullNameInformation::default();
    match parts.as_slice() {
        [first] => user.first_name = first.to_string(),
        [first, last] => {
            user.first_name = first.to_string();
            user.last_name = last.to_string();
        }
        _ => user.first_name = input.to_string(),
    }
    user.username = format!("{}{}", user.first_name, user.last_name);
    user
}

/// Random password over an alphabet without look-alike characters.
///
/// Bytes are reduced modulo the next power of two above the alphabet size
/// and out-of-range values are rejected, so every character is equally likely.
pub fn random_password(length: usize) -> String {
    let characters: Vec<char> = PASSWORD_CHARACTERS.chars().collect();
    let range = characters.len().next_power_of_two();
    let mut rng = rand::rng();

    let mut password = String::with_capacity(length);
    while password.chars().count() < length {
        let r = usize::from(rng.random::<u8>()) % range;
        if let Some(c) = characters.get(r) {
            password.push(*c);
        }
    }
    password
}

/// RFC 3339 time of the last invitation email, empty if none was sent
pub fn last_email_sent_string(member: &Member) -> String {
    member
        .last_email_sent
        .filter(|ts| *ts > 0)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|time| time.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;

    #[test]
    fn test_member_filter_definitions() {
        let filter = MemberFilter::default();
        assert_eq!(filter.storage_key(), "MemberList");

        let properties: Vec<String> = filter
            .filter_definitions()
            .into_iter()
            .map(|d| d.property)
            .collect();
        assert_eq!(
            properties,
            vec![
                "is_active",
                "is_last_email_sent",
                "is_vote_weight_one",
                "is_present_in_meeting_ids",
                "committee_ids"
            ]
        );
        assert_eq!(filter.dynamic_filters().len(), 2);
    }

    #[test]
    fn test_member_derived_fields() {
        let member = Member {
            id: 1,
            username: "ada".to_string(),
            last_email_sent: Some(1_700_000_000),
            default_vote_weight: Some("2.000000".to_string()),
            ..Default::default()
        };
        assert_eq!(member.field("is_last_email_sent"), Some(Value::Bool(true)));
        assert_eq!(member.field("is_vote_weight_one"), Some(Value::Bool(false)));
        assert_eq!(member.field("is_active"), Some(Value::Null));

        let fresh = Member::default();
        assert!(!fresh.is_last_email_sent());
        assert!(fresh.is_vote_weight_one());
    }

    #[test]
    fn test_parse_first_space_last() {
        let user = parse_user_string("Ada Lovelace", NamingSchema::FirstSpaceLast);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.username, "AdaLovelace");

        let user = parse_user_string("Ada", NamingSchema::FirstSpaceLast);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "");

        let user = parse_user_string("Augusta Ada King", NamingSchema::FirstSpaceLast);
        assert_eq!(user.first_name, "Augusta Ada King");
        assert_eq!(user.last_name, "");
    }

    #[test]
    fn test_parse_last_comma_first() {
        let user = parse_user_string("Lovelace,Ada", NamingSchema::LastCommaFirst);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.username, "AdaLovelace");
    }

    #[test]
    fn test_random_password() {
        let password = random_password(10);
        assert_eq!(password.chars().count(), 10);
        assert!(password.chars().all(|c| PASSWORD_CHARACTERS.contains(c)));
        assert!(random_password(0).is_empty());
    }

    #[test]
    fn test_last_email_sent_string() {
        let mut member = Member::default();
        assert_eq!(last_email_sent_string(&member), "");

        member.last_email_sent = Some(0);
        assert_eq!(last_email_sent_string(&member), "");

        member.last_email_sent = Some(86_400);
        assert_eq!(last_email_sent_string(&member), "1970-01-02T00:00:00+00:00");
    }
}
