use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::ListError;
use crate::model::{is_truthy, Entity};

/// Property the default motion list is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortProperty {
    SortWeight,
    #[default]
    Number,
}

impl SortProperty {
    pub fn field_name(&self) -> &'static str {
        match self {
            SortProperty::SortWeight => "sort_weight",
            SortProperty::Number => "number",
        }
    }
}

impl std::fmt::Display for SortProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

impl FromStr for SortProperty {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sort_weight" => Ok(SortProperty::SortWeight),
            "number" => Ok(SortProperty::Number),
            _ => Err(ListError::InvalidSetting {
                setting: "motions_default_sorting".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Compare two strings the way a user-facing list expects.
///
/// Levels, each consulted only when the previous one ties: base letters
/// ignoring accents and case (`ß` counts as `ss`), then accents (unaccented
/// first), then case (lowercase first), then code points. Equal only for
/// identical strings.
pub fn collate(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(primary_key(b))
        .then_with(|| secondary_key(a).cmp(secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(tertiary_key(b)))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .flat_map(|c| match c {
            'ß' => ['s', 's'].into_iter().take(2),
            other => [other, other].into_iter().take(1),
        })
}

fn secondary_key(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

fn tertiary_key(s: &str) -> impl Iterator<Item = (bool, char)> + '_ {
    s.nfd().map(|c| (!c.is_lowercase(), c))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Default ordering of a list by one configurable property.
///
/// Entities with a value for the property come first, ordered by that value
/// with the title as tie-break; the rest follow, ordered by title. "Having a
/// value" uses loose truthiness, so a sort weight of `0` counts as no value.
///
/// `compare` is a total order for any mix of value types, so `sort` never
/// sees an inconsistent comparator.
#[derive(Debug, Clone)]
pub struct ListSorter {
    property: SortProperty,
    title_field: String,
}

impl Default for ListSorter {
    fn default() -> Self {
        Self::new(SortProperty::default())
    }
}

impl ListSorter {
    pub fn new(property: SortProperty) -> Self {
        Self {
            property,
            title_field: "title".to_string(),
        }
    }

    pub fn with_title_field(mut self, field: impl Into<String>) -> Self {
        self.title_field = field.into();
        self
    }

    pub fn property(&self) -> SortProperty {
        self.property
    }

    pub fn set_property(&mut self, property: SortProperty) {
        self.property = property;
    }

    pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        let field = self.property.field_name();
        let a_value = a.field(field).filter(|v| is_truthy(Some(v)));
        let b_value = b.field(field).filter(|v| is_truthy(Some(v)));

        match (a_value, b_value) {
            (Some(x), Some(y)) => self
                .compare_values(&x, &y)
                .then_with(|| self.compare_titles(a, b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.compare_titles(a, b),
        }
    }

    pub fn sort<E: Entity>(&self, items: &mut [E]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    /// Sort weights: numbers first in numeric order, then anything else by
    /// its text. Other properties compare every value by its text.
    fn compare_values(&self, x: &Value, y: &Value) -> Ordering {
        if self.property == SortProperty::SortWeight {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => return x.total_cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => {}
            }
        }
        collate(&render(x), &render(y))
    }

    fn compare_titles<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        let title = |entity: &E| {
            entity
                .field(&self.title_field)
                .map(|v| if v.is_null() { String::new() } else { render(&v) })
                .unwrap_or_default()
        };
        collate(&title(a), &title(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn titles(items: &[Value]) -> Vec<&str> {
        items
            .iter()
            .map(|item| item["title"].as_str().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_equal_numbers_break_tie_by_title() {
        let mut items = vec![
            json!({"number": "5", "title": "B"}),
            json!({"number": "5", "title": "A"}),
        ];
        ListSorter::new(SortProperty::Number).sort(&mut items);
        assert_eq!(titles(&items), vec!["A", "B"]);
    }

    #[test]
    fn test_entities_without_value_sort_last() {
        let mut items = vec![
            json!({"title": "Z"}),
            json!({"number": "1", "title": "A"}),
        ];
        ListSorter::new(SortProperty::Number).sort(&mut items);
        assert_eq!(titles(&items), vec!["A", "Z"]);

        let mut items = vec![
            json!({"title": "Z"}),
            json!({"number": "", "title": "M"}),
            json!({"title": "B"}),
        ];
        ListSorter::new(SortProperty::Number).sort(&mut items);
        assert_eq!(titles(&items), vec!["B", "M", "Z"]);
    }

    #[test]
    fn test_sort_weight_compares_numerically() {
        let mut items = vec![
            json!({"sort_weight": 10, "title": "ten"}),
            json!({"sort_weight": 9, "title": "nine"}),
            json!({"sort_weight": -3, "title": "minus three"}),
        ];
        ListSorter::new(SortProperty::SortWeight).sort(&mut items);
        assert_eq!(titles(&items), vec!["minus three", "nine", "ten"]);
    }

    #[test]
    fn test_numbers_compare_as_text() {
        let mut items = vec![
            json!({"number": "A10", "title": "x"}),
            json!({"number": "a9", "title": "y"}),
        ];
        ListSorter::new(SortProperty::Number).sort(&mut items);
        assert_eq!(titles(&items), vec!["x", "y"]);
    }

    #[test]
    fn test_zero_sort_weight_counts_as_missing() {
        // Current behavior: a weight of 0 is "no value" and sorts after
        // every non-zero weight, even negative ones.
        let mut items = vec![
            json!({"sort_weight": 0, "title": "zero"}),
            json!({"sort_weight": 2, "title": "two"}),
            json!({"sort_weight": -1, "title": "minus one"}),
        ];
        ListSorter::new(SortProperty::SortWeight).sort(&mut items);
        assert_eq!(titles(&items), vec!["minus one", "two", "zero"]);
    }

    #[test]
    fn test_mixed_types_fall_back_to_text() {
        let sorter = ListSorter::new(SortProperty::Number);
        let a = json!({"number": 12, "title": "a"});
        let b = json!({"number": "3", "title": "b"});
        assert_eq!(sorter.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_mixed_sort_weights_sort_without_panicking() {
        let sorter = ListSorter::new(SortProperty::SortWeight);
        let a = json!({"sort_weight": 9, "title": "a"});
        let b = json!({"sort_weight": 10, "title": "b"});
        let c = json!({"sort_weight": "10a", "title": "c"});
        assert_eq!(sorter.compare(&a, &b), Ordering::Less);
        assert_eq!(sorter.compare(&b, &c), Ordering::Less);
        assert_eq!(sorter.compare(&a, &c), Ordering::Less);

        let mut items: Vec<Value> = (0..60)
            .map(|i| {
                let weight = match i % 4 {
                    0 => json!(i % 7),
                    1 => json!(format!("{}a", i % 11)),
                    2 => json!(i as f64 / 3.0),
                    _ => json!(i % 5 == 0),
                };
                json!({"sort_weight": weight, "title": format!("t{}", i % 9)})
            })
            .collect();
        sorter.sort(&mut items);
        for pair in items.windows(2) {
            assert_ne!(sorter.compare(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_mixed_numbers_sort_without_panicking() {
        let sorter = ListSorter::new(SortProperty::Number);
        let mut items: Vec<Value> = (0..60)
            .map(|i| {
                let number = if i % 2 == 0 { json!(i % 13) } else { json!(format!("{}", i % 13)) };
                json!({"number": number, "title": format!("t{}", i % 5)})
            })
            .collect();
        sorter.sort(&mut items);
        for pair in items.windows(2) {
            assert_ne!(sorter.compare(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_collation() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("Motion", "motion"), Ordering::Greater);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_collation_of_accented_letters() {
        assert_eq!(collate("Ärger", "Zebra"), Ordering::Less);
        assert_eq!(collate("Éclair", "Fuchs"), Ordering::Less);
        assert_eq!(collate("Öl", "Ofen"), Ordering::Greater);
        assert_eq!(collate("Straße", "Strasse"), Ordering::Greater);
        assert_eq!(collate("Strasse", "Strassen"), Ordering::Less);
        // Accents only break ties between otherwise equal words
        assert_eq!(collate("Apfel", "Äpfel"), Ordering::Less);
        assert_eq!(collate("äpfel", "Apfel"), Ordering::Greater);
    }

    #[test]
    fn test_accented_titles_sort_with_their_base_letter() {
        let mut items = vec![
            json!({"title": "Zuschuss"}),
            json!({"title": "Änderung der Satzung"}),
            json!({"title": "Beitrag"}),
            json!({"title": "Über uns"}),
        ];
        ListSorter::new(SortProperty::Number).sort(&mut items);
        assert_eq!(
            titles(&items),
            vec!["Änderung der Satzung", "Beitrag", "Über uns", "Zuschuss"]
        );
    }

    #[test]
    fn test_parse_setting() {
        assert_eq!("sort_weight".parse::<SortProperty>().unwrap(), SortProperty::SortWeight);
        assert_eq!("number".parse::<SortProperty>().unwrap(), SortProperty::Number);
        assert!(matches!(
            "weight".parse::<SortProperty>(),
            Err(ListError::InvalidSetting { .. })
        ));
    }
}
