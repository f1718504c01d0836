//! Canonical type names and flat type sets


use derive_more::Display;
use dtc_parser::ast::expr::Constant;
use dtc_utils::code_fmt::join_display;
use indexmap::IndexSet;

/// A canonical type name
///
/// Built-in names are a closed set. Anything else, such as a class name, is
/// [`TypeName::Named`]. [`TypeName::parse`] always prefers the built-in
/// variant, so `"int"` and the `int` builtin compare equal.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum TypeName {
    #[display("int")]
    Int,
    #[display("float")]
    Float,
    #[display("complex")]
    Complex,
    #[display("str")]
    Str,
    #[display("bytes")]
    Bytes,
    #[display("bool")]
    Bool,
    #[display("None")]
    NoneType,
    #[display("list")]
    List,
    #[display("tuple")]
    Tuple,
    #[display("dict")]
    Dict,
    #[display("set")]
    Set,
    #[display("frozenset")]
    FrozenSet,
    #[display("range")]
    Range,
    #[display("slice")]
    Slice,
    #[display("type")]
    Type,
    #[display("object")]
    Object,
    /// Matches every contract
    #[display("any")]
    Any,
    /// A class or user-supplied name
    #[display("{_0}")]
    Named(String),
}

impl TypeName {
    /// Every built-in type name with its spelling
    const BUILTINS: [(&'static str, Self); 17] = [
        ("int", Self::Int),
        ("float", Self::Float),
        ("complex", Self::Complex),
        ("str", Self::Str),
        ("bytes", Self::Bytes),
        ("bool", Self::Bool),
        ("None", Self::NoneType),
        ("list", Self::List),
        ("tuple", Self::Tuple),
        ("dict", Self::Dict),
        ("set", Self::Set),
        ("frozenset", Self::FrozenSet),
        ("range", Self::Range),
        ("slice", Self::Slice),
        ("type", Self::Type),
        ("object", Self::Object),
        ("any", Self::Any),
    ];

    /// Resolve a built-in spelling, if `name` is one
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        Self::BUILTINS
            .iter()
            .find(|(spelling, _)| *spelling == name)
            .map(|(_, ty)| ty.clone())
    }

    /// Parse a type name token
    #[must_use]
    pub fn parse(name: &str) -> Self {
        Self::builtin(name).unwrap_or_else(|| Self::Named(name.to_string()))
    }

    /// The type produced by calling the built-in constructor `name`
    ///
    /// `None` and `any` are not callable and give [`None`].
    #[must_use]
    pub fn constructor(name: &str) -> Option<Self> {
        Self::builtin(name).filter(|ty| !matches!(ty, Self::NoneType | Self::Any))
    }
}

impl From<&Constant> for TypeName {
    fn from(value: &Constant) -> Self {
        match value {
            Constant::Int(_) => Self::Int,
            Constant::Float(_) => Self::Float,
            Constant::Complex(_) => Self::Complex,
            Constant::Str(_) => Self::Str,
            Constant::Bytes(_) => Self::Bytes,
            Constant::Bool(_) => Self::Bool,
            Constant::None => Self::NoneType,
            Constant::Ellipsis => Self::Object,
        }
    }
}

/// A flat set of possible type names
///
/// Iteration and display follow insertion order; equality ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeSet(IndexSet<TypeName>);

impl TypeSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set of exactly one name
    #[must_use]
    pub fn single(name: TypeName) -> Self {
        Self(IndexSet::from([name]))
    }

    /// Add a name to the set
    pub fn insert(&mut self, name: TypeName) {
        self.0.insert(name);
    }

    /// Add every name of `other` to the set
    pub fn union_with(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Determine if the set holds no names
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of names in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Determine if `name` is in the set
    #[must_use]
    pub fn contains(&self, name: &TypeName) -> bool {
        self.0.contains(name)
    }

    /// Iterate over the names in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.0.iter()
    }

    /// Determine if every name of this set is also in `other`
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Determine if a value of this set satisfies the `declared` set
    ///
    /// This holds if the set contains [`TypeName::Any`] or is a subset of
    /// `declared`.
    #[must_use]
    pub fn is_compatible_with(&self, declared: &Self) -> bool {
        self.contains(&TypeName::Any) || self.is_subset(declared)
    }
}

impl FromIterator<TypeName> for TypeSet {
    fn from_iter<T: IntoIterator<Item = TypeName>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<TypeName> for TypeSet {
    fn extend<T: IntoIterator<Item = TypeName>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for TypeSet {
    type Item = TypeName;
    type IntoIter = indexmap::set::IntoIter<TypeName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for TypeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", join_display(&self.0, ", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a set from spellings
    fn set(names: &[&str]) -> TypeSet {
        names.iter().map(|name| TypeName::parse(name)).collect()
    }

    #[test]
    fn builtin_spellings_win_over_named() {
        assert_eq!(TypeName::parse("int"), TypeName::Int);
        assert_eq!(TypeName::parse("None"), TypeName::NoneType);
        assert_eq!(TypeName::parse("A"), TypeName::Named("A".to_string()));
        assert_eq!(TypeName::parse("frozenset").to_string(), "frozenset");
    }

    #[test]
    fn constructors_exclude_none_and_any() {
        assert_eq!(TypeName::constructor("range"), Some(TypeName::Range));
        assert_eq!(TypeName::constructor("None"), None);
        assert_eq!(TypeName::constructor("any"), None);
        assert_eq!(TypeName::constructor("Point"), None);
    }

    #[test]
    fn constants_map_to_their_type() {
        assert_eq!(TypeName::from(&Constant::Int("42".to_string())), TypeName::Int);
        assert_eq!(TypeName::from(&Constant::Str("x".to_string())), TypeName::Str);
        assert_eq!(TypeName::from(&Constant::None), TypeName::NoneType);
        assert_eq!(TypeName::from(&Constant::Bool(true)), TypeName::Bool);
        assert_eq!(TypeName::from(&Constant::Ellipsis), TypeName::Object);
    }

    #[test]
    fn equality_ignores_order_but_display_keeps_it() {
        assert_eq!(set(&["str", "int"]), set(&["int", "str"]));
        assert_eq!(set(&["str", "int"]).to_string(), "{str, int}");
        assert_eq!(set(&["int", "int"]).len(), 1);
    }

    #[test]
    fn compatibility_is_subset_or_any() {
        let declared = set(&["int", "str"]);

        assert!(set(&["int"]).is_compatible_with(&declared));
        assert!(set(&["str", "int"]).is_compatible_with(&declared));
        assert!(!set(&["int", "float"]).is_compatible_with(&declared));
        assert!(set(&["any", "float"]).is_compatible_with(&declared));
        assert!(TypeSet::new().is_compatible_with(&declared));
    }
}
