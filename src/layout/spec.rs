//! layout::spec
//!
//! The validation node tree: matchers and group/dataset/attribute/
//! property specifications.
//!
//! # Semantics
//!
//! Each node owns a matcher for its identity, an `optional` flag, and
//! children that are only evaluated against candidates whose identity
//! matched. A node may match several real objects (wildcard); the
//! node's own verdict is `any()` over its matches, and a failed
//! verdict on an optional node is downgraded to success at
//! construction of the result.
//!
//! Validation returns an owned result list per call; callers merge.

use serde::{Deserialize, Serialize};

use super::report::ValidationResult;
use crate::core::types::{ObjectPath, Pattern};
use crate::store::{AttrValue, Dataset, Group};

/// Identity matcher for group/dataset/attribute names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "param", rename_all = "snake_case")]
pub enum Matcher {
    /// Exact name.
    Equal(String),
    /// `*`: every qualifying object, for groups recursively at or
    /// below this level.
    Wildcard,
    /// Anchored regex on the name.
    Regex(Pattern),
    /// Any name at this level.
    Any,
}

impl Matcher {
    /// Parse the builder shorthand: `*` is the wildcard, anything
    /// else an exact name.
    pub fn name(s: &str) -> Self {
        if s == "*" {
            Matcher::Wildcard
        } else {
            Matcher::Equal(s.to_string())
        }
    }

    /// Does a candidate name match?
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Equal(name) => candidate == name,
            Matcher::Wildcard | Matcher::Any => true,
            Matcher::Regex(pattern) => pattern.matches(candidate),
        }
    }

    fn describe(&self) -> String {
        match self {
            Matcher::Equal(name) => format!("'{name}'"),
            Matcher::Wildcard => "'*'".to_string(),
            Matcher::Regex(pattern) => format!("~'{pattern}'"),
            Matcher::Any => "<any>".to_string(),
        }
    }
}

/// Matcher for attribute and property values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "param", rename_all = "snake_case")]
pub enum ValueMatcher {
    /// Any value ("exists is enough").
    Any,
    /// Exact value.
    Equal(AttrValue),
    /// Membership in a fixed set.
    In(Vec<AttrValue>),
    /// Anchored regex on the flat-encoded value.
    Regex(Pattern),
}

impl ValueMatcher {
    /// Does a candidate value match?
    pub fn matches(&self, candidate: &AttrValue) -> bool {
        match self {
            ValueMatcher::Any => true,
            ValueMatcher::Equal(reference) => candidate == reference,
            ValueMatcher::In(allowed) => allowed.contains(candidate),
            ValueMatcher::Regex(pattern) => pattern.matches(&candidate.encode()),
        }
    }

    fn describe(&self) -> String {
        match self {
            ValueMatcher::Any => "<any>".to_string(),
            ValueMatcher::Equal(v) => format!("'{}'", v.encode()),
            ValueMatcher::In(vs) => {
                let rendered: Vec<String> = vs.iter().map(|v| v.encode()).collect();
                format!("one of {rendered:?}")
            }
            ValueMatcher::Regex(pattern) => format!("~'{pattern}'"),
        }
    }
}

/// An attribute check: name matcher plus value matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrSpec {
    pub name: Matcher,
    pub value: ValueMatcher,
    pub optional: bool,
}

impl AttrSpec {
    /// Validate against the attribute map of one object.
    ///
    /// Appends one name-level result (did any attribute name match?)
    /// and one value-level result per name-matched attribute.
    pub(crate) fn validate(
        &self,
        attrs: &std::collections::BTreeMap<String, AttrValue>,
        at: &ObjectPath,
    ) -> Vec<ValidationResult> {
        let describe = |suffix: &str| {
            format!(
                "attribute {}{} at '{}'",
                self.name.describe(),
                suffix,
                at
            )
        };

        if attrs.is_empty() {
            return vec![ValidationResult::new(describe(""), false, self.optional)];
        }

        let mut results = Vec::new();
        let mut any_name_matched = false;
        for (name, value) in attrs {
            if !self.name.matches(name) {
                continue;
            }
            any_name_matched = true;
            results.push(ValidationResult::new(
                describe(&format!(" = {}", self.value.describe())),
                self.value.matches(value),
                self.optional,
            ));
        }
        results.push(ValidationResult::new(
            describe(""),
            any_name_matched,
            self.optional,
        ));
        results
    }
}

/// A dataset property a layout can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetProperty {
    Ndim,
    Shape,
    Dtype,
}

impl DatasetProperty {
    fn value_of(&self, dataset: &Dataset) -> AttrValue {
        match self {
            DatasetProperty::Ndim => AttrValue::Int(dataset.ndim() as i64),
            DatasetProperty::Shape => AttrValue::List(
                dataset.shape.iter().map(|&n| AttrValue::Int(n as i64)).collect(),
            ),
            DatasetProperty::Dtype => AttrValue::Str(dataset.dtype.to_string()),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            DatasetProperty::Ndim => "ndim",
            DatasetProperty::Shape => "shape",
            DatasetProperty::Dtype => "dtype",
        }
    }
}

/// A dataset-property check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSpec {
    pub property: DatasetProperty,
    pub value: ValueMatcher,
    pub optional: bool,
}

impl PropSpec {
    pub(crate) fn validate(&self, dataset: &Dataset, at: &ObjectPath) -> ValidationResult {
        let actual = self.property.value_of(dataset);
        ValidationResult::new(
            format!(
                "{} = {} at '{}'",
                self.property.describe(),
                self.value.describe(),
                at
            ),
            self.value.matches(&actual),
            self.optional,
        )
    }
}

/// A dataset validation node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: Matcher,
    pub optional: bool,
    #[serde(default)]
    pub attrs: Vec<AttrSpec>,
    #[serde(default)]
    pub props: Vec<PropSpec>,
}

impl DatasetSpec {
    fn new(name: Matcher) -> Self {
        Self {
            name,
            optional: false,
            attrs: Vec::new(),
            props: Vec::new(),
        }
    }

    /// Mark this node optional.
    pub fn optional(&mut self) -> &mut Self {
        self.optional = true;
        self
    }

    /// Require an attribute.
    pub fn require_attr(&mut self, name: &str, value: ValueMatcher) -> &mut Self {
        self.attrs.push(AttrSpec {
            name: Matcher::name(name),
            value,
            optional: false,
        });
        self
    }

    /// Add an advisory attribute check.
    pub fn optional_attr(&mut self, name: &str, value: ValueMatcher) -> &mut Self {
        self.attrs.push(AttrSpec {
            name: Matcher::name(name),
            value,
            optional: true,
        });
        self
    }

    /// Require a number of dimensions.
    pub fn ndim(&mut self, n: usize) -> &mut Self {
        self.props.push(PropSpec {
            property: DatasetProperty::Ndim,
            value: ValueMatcher::Equal(AttrValue::Int(n as i64)),
            optional: false,
        });
        self
    }

    /// Require an exact shape.
    pub fn shape(&mut self, shape: Vec<usize>) -> &mut Self {
        self.props.push(PropSpec {
            property: DatasetProperty::Shape,
            value: ValueMatcher::Equal(AttrValue::List(
                shape.into_iter().map(|n| AttrValue::Int(n as i64)).collect(),
            )),
            optional: false,
        });
        self
    }

    /// Require an element type.
    pub fn dtype(&mut self, dtype: crate::store::Dtype) -> &mut Self {
        self.props.push(PropSpec {
            property: DatasetProperty::Dtype,
            value: ValueMatcher::Equal(AttrValue::Str(dtype.to_string())),
            optional: false,
        });
        self
    }

    /// Validate the datasets at one hierarchy level.
    pub(crate) fn validate(&self, parent: &Group, base: &ObjectPath) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut matched_any = false;
        for (name, dataset) in parent.child_datasets() {
            if !self.name.matches(name) {
                continue;
            }
            matched_any = true;
            let path = base.join(name);
            for attr in &self.attrs {
                results.extend(attr.validate(&dataset.attributes, &path));
            }
            for prop in &self.props {
                results.push(prop.validate(dataset, &path));
            }
        }
        results.push(ValidationResult::new(
            format!("dataset {} under '{}'", self.name.describe(), base),
            matched_any,
            self.optional,
        ));
        results
    }
}

/// A group validation node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: Matcher,
    pub optional: bool,
    #[serde(default)]
    pub attrs: Vec<AttrSpec>,
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

impl GroupSpec {
    pub(crate) fn new(name: Matcher) -> Self {
        Self {
            name,
            optional: false,
            attrs: Vec::new(),
            datasets: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Mark this node optional.
    pub fn optional(&mut self) -> &mut Self {
        self.optional = true;
        self
    }

    /// Require an attribute on every matched group.
    pub fn require_attr(&mut self, name: &str, value: ValueMatcher) -> &mut Self {
        self.attrs.push(AttrSpec {
            name: Matcher::name(name),
            value,
            optional: false,
        });
        self
    }

    /// Add an advisory attribute check.
    pub fn optional_attr(&mut self, name: &str, value: ValueMatcher) -> &mut Self {
        self.attrs.push(AttrSpec {
            name: Matcher::name(name),
            value,
            optional: true,
        });
        self
    }

    /// A child group node; an existing node with the same matcher is
    /// reused.
    pub fn group(&mut self, name: &str) -> &mut GroupSpec {
        let matcher = Matcher::name(name);
        if let Some(i) = self.groups.iter().position(|g| g.name == matcher) {
            return &mut self.groups[i];
        }
        self.groups.push(GroupSpec::new(matcher));
        self.groups.last_mut().expect("just pushed")
    }

    /// A dataset node; an existing node with the same matcher is
    /// reused. `*` matches every dataset at the level; such a node is
    /// optional by construction (an empty level is not a failure),
    /// while its attribute and property children keep their own
    /// required/optional flags.
    pub fn dataset(&mut self, name: &str) -> &mut DatasetSpec {
        let matcher = if name == "*" {
            Matcher::Any
        } else {
            Matcher::name(name)
        };
        if let Some(i) = self.datasets.iter().position(|d| d.name == matcher) {
            return &mut self.datasets[i];
        }
        let mut spec = DatasetSpec::new(matcher);
        if matches!(spec.name, Matcher::Any) {
            spec.optional = true;
        }
        self.datasets.push(spec);
        self.datasets.last_mut().expect("just pushed")
    }

    /// Validate this node against candidate groups under `target`.
    ///
    /// Wildcard nodes consider every group at or below the level
    /// (including the level itself); other nodes consider direct
    /// child groups only. Children of this node run only against
    /// candidates whose identity matched.
    pub(crate) fn validate(&self, target: &Group, base: &ObjectPath) -> Vec<ValidationResult> {
        let wildcard = matches!(self.name, Matcher::Wildcard);
        let candidates: Vec<(ObjectPath, &Group)> = if wildcard {
            target.descendant_groups(base)
        } else {
            target
                .child_groups()
                .map(|(name, g)| (base.join(name), g))
                .collect()
        };

        let describe = format!("group {} under '{}'", self.name.describe(), base);

        // a required node with zero candidates fails without
        // evaluating children
        if candidates.is_empty() && !self.optional {
            return vec![ValidationResult::new(describe, false, false)];
        }

        let mut results = Vec::new();
        let mut matched_any = false;
        for (path, group) in candidates {
            let candidate_name = if wildcard {
                path.to_string()
            } else {
                path.basename().to_string()
            };
            if !(wildcard || self.name.matches(&candidate_name)) {
                continue;
            }
            matched_any = true;
            for attr in &self.attrs {
                results.extend(attr.validate(&group.attributes, &path));
            }
            for dataset in &self.datasets {
                results.extend(dataset.validate(group, &path));
            }
            for child in &self.groups {
                results.extend(child.validate(group, &path));
            }
        }
        results.push(ValidationResult::new(describe, matched_any, self.optional));
        results
    }

    /// Render the node tree for inspection.
    pub(crate) fn dumps_into(&self, indent: usize, out: &mut String) {
        let pad = " ".repeat(indent);
        out.push_str(&format!(
            "{pad}group {} (optional={})\n",
            self.name.describe(),
            self.optional
        ));
        for attr in &self.attrs {
            out.push_str(&format!(
                "{pad}  attr {} = {} (optional={})\n",
                attr.name.describe(),
                attr.value.describe(),
                attr.optional
            ));
        }
        for dataset in &self.datasets {
            out.push_str(&format!(
                "{pad}  dataset {} (optional={})\n",
                dataset.name.describe(),
                dataset.optional
            ));
            for attr in &dataset.attrs {
                out.push_str(&format!(
                    "{pad}    attr {} = {} (optional={})\n",
                    attr.name.describe(),
                    attr.value.describe(),
                    attr.optional
                ));
            }
            for prop in &dataset.props {
                out.push_str(&format!(
                    "{pad}    {} = {} (optional={})\n",
                    prop.property.describe(),
                    prop.value.describe(),
                    prop.optional
                ));
            }
        }
        for group in &self.groups {
            group.dumps_into(indent + 2, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_shorthand() {
        assert_eq!(Matcher::name("*"), Matcher::Wildcard);
        assert_eq!(Matcher::name("devices"), Matcher::Equal("devices".to_string()));
    }

    #[test]
    fn matcher_matching() {
        assert!(Matcher::name("devices").matches("devices"));
        assert!(!Matcher::name("devices").matches("device"));
        assert!(Matcher::Wildcard.matches("anything"));
        assert!(Matcher::Regex(Pattern::new("dev[0-9]+").unwrap()).matches("dev7"));
    }

    #[test]
    fn value_matching() {
        assert!(ValueMatcher::Any.matches(&AttrValue::Int(1)));
        assert!(ValueMatcher::Equal(AttrValue::from("x")).matches(&AttrValue::from("x")));
        assert!(!ValueMatcher::Equal(AttrValue::from("x")).matches(&AttrValue::from("y")));
        assert!(ValueMatcher::Regex(Pattern::new("m.*").unwrap()).matches(&AttrValue::from("m/s")));
    }

    #[test]
    fn builder_dedups_group_specs() {
        let mut spec = GroupSpec::new(Matcher::Any);
        spec.group("devices").require_attr("a", ValueMatcher::Any);
        spec.group("devices").require_attr("b", ValueMatcher::Any);
        assert_eq!(spec.groups.len(), 1);
        assert_eq!(spec.groups[0].attrs.len(), 2);
    }

    #[test]
    fn serde_roundtrip_preserves_tree() {
        let mut spec = GroupSpec::new(Matcher::Wildcard);
        spec.require_attr("long_name", ValueMatcher::Any);
        spec.dataset("u").ndim(3);
        let json = serde_json::to_string(&spec).unwrap();
        let back: GroupSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
