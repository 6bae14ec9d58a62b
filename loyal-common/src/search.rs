//! Search filter over the loaded people

use crate::model::Person;

/// True when `query` selects everything (empty or whitespace only)
pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

/// Case-insensitive substring match on name or area
pub fn matches(person: &Person, query: &str) -> bool {
    is_blank(query) || contains_lowercase(person, &query.to_lowercase())
}

/// Indices into `people` of the entries matching `query`, in input order
pub fn filter_indices(people: &[Person], query: &str) -> Vec<usize> {
    if is_blank(query) {
        return (0..people.len()).collect();
    }
    let needle = query.to_lowercase();
    people
        .iter()
        .enumerate()
        .filter(|(_, p)| contains_lowercase(p, &needle))
        .map(|(i, _)| i)
        .collect()
}

fn contains_lowercase(person: &Person, needle: &str) -> bool {
    person.name.to_lowercase().contains(needle) || person.area.to_lowercase().contains(needle)
}

/// Matching people, in input order
pub fn filter<'a>(people: &'a [Person], query: &str) -> Vec<&'a Person> {
    filter_indices(people, query)
        .into_iter()
        .map(|i| &people[i])
        .collect()
}
