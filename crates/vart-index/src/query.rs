use crate::item::{AttributeValue, Item};

/// Which sort keys of a partition a query reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SortKeyCondition {
    #[default]
    All,
    Equals(String),
    BeginsWith(String),
    /// Inclusive on both ends.
    Between(String, String),
}

impl SortKeyCondition {
    pub fn matches(&self, sort_key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Equals(k) => sort_key == k,
            Self::BeginsWith(p) => sort_key.starts_with(p.as_str()),
            Self::Between(lo, hi) => lo.as_str() <= sort_key && sort_key <= hi.as_str(),
        }
    }
}

/// A predicate on row attributes, evaluated after the sort-key condition and
/// the limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Equals(String, AttributeValue),
    /// True when the attribute is absent or differs from the value.
    NotEquals(String, AttributeValue),
    Exists(String),
    NotExists(String),
    And(Vec<Filter>),
}

impl Filter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Equals(name, value) => item.get(name) == Some(value),
            Self::NotEquals(name, value) => item.get(name) != Some(value),
            Self::Exists(name) => item.get(name).is_some(),
            Self::NotExists(name) => item.get(name).is_none(),
            Self::And(all) => all.iter().all(|f| f.matches(item)),
        }
    }
}

/// A single-partition read.
///
/// The limit bounds how many rows are *read*, before the filter runs, so a
/// filtered query may return fewer rows than the limit even when more
/// matching rows exist further along the partition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub condition: SortKeyCondition,
    pub descending: bool,
    pub limit: Option<usize>,
    pub filter: Option<Filter>,
}

impl Query {
    /// Every row of the partition, ascending.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn condition(mut self, condition: SortKeyCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Apply this query to rows already sorted ascending by sort key.
    pub fn evaluate<'a, I>(&self, rows: I) -> Vec<Item>
    where
        I: Iterator<Item = &'a Item>,
    {
        let mut read: Vec<&Item> = rows
            .filter(|i| self.condition.matches(&i.sort_key))
            .collect();
        if self.descending {
            read.reverse();
        }
        if let Some(n) = self.limit {
            read.truncate(n);
        }
        read.into_iter()
            .filter(|i| self.filter.as_ref().map_or(true, |f| f.matches(i)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Item> {
        vec![
            Item::new("app", "000001").with("deleted", true),
            Item::new("app", "000002"),
            Item::new("app", "000003").with("deleted", false),
            Item::new("app", "LATEST"),
        ]
    }

    fn keys(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.sort_key.as_str()).collect()
    }

    #[test]
    fn descending_with_limit_reads_latest_first() {
        let rows = rows();
        let out = Query::all().descending().limit(2).evaluate(rows.iter());
        assert_eq!(keys(&out), vec!["LATEST", "000003"]);
    }

    #[test]
    fn filter_runs_after_limit() {
        let rows = rows();
        let not_deleted = Filter::NotEquals("deleted".into(), AttributeValue::Bool(true));
        let out = Query::all().limit(1).filter(not_deleted.clone()).evaluate(rows.iter());
        assert!(out.is_empty());
        let out = Query::all().filter(not_deleted).evaluate(rows.iter());
        assert_eq!(keys(&out), vec!["000002", "000003", "LATEST"]);
    }

    #[test]
    fn sort_key_conditions() {
        let rows = rows();
        let between = Query::all()
            .condition(SortKeyCondition::Between("000002".into(), "000003".into()))
            .evaluate(rows.iter());
        assert_eq!(keys(&between), vec!["000002", "000003"]);
        let prefix = Query::all()
            .condition(SortKeyCondition::BeginsWith("0".into()))
            .descending()
            .evaluate(rows.iter());
        assert_eq!(keys(&prefix), vec!["000003", "000002", "000001"]);
        let exact = Query::all()
            .condition(SortKeyCondition::Equals("LATEST".into()))
            .evaluate(rows.iter());
        assert_eq!(keys(&exact), vec!["LATEST"]);
    }

    #[test]
    fn compound_filters() {
        let item = Item::new("p", "s").with("a", "x");
        assert!(Filter::And(vec![
            Filter::Exists("a".into()),
            Filter::NotExists("b".into()),
            Filter::Equals("a".into(), "x".into()),
        ])
        .matches(&item));
        assert!(!Filter::Equals("a".into(), "y".into()).matches(&item));
    }
}
