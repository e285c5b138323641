// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic values bound into templates.

use alloc::borrow::Cow;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::component::{Component, ComponentElement};
use crate::template::TemplateResult;

/// A value supplied for one template hole.
///
/// Cloning is cheap: every heap payload is reference counted.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value. Clears attributes and renders nothing.
    #[default]
    Null,
    /// A boolean. Attributes treat `true` as present and `false` as absent.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(Rc<str>),
    /// An event listener.
    Listener(Listener),
    /// An arbitrary host object, compared by identity.
    Object(Rc<dyn Any>),
    /// A template to render at a child position.
    Template(Rc<TemplateResult>),
    /// One of two lazily built branches.
    Conditional(Rc<ConditionalValue>),
    /// A keyed list.
    Repeat(Rc<RepeatValue>),
    /// A component.
    Component(ComponentElement),
    /// Several attributes, properties and listeners for one element.
    Spread(Rc<SpreadValue>),
}

/// Discriminant of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Null`].
    Null,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Number`].
    Number,
    /// [`Value::String`].
    String,
    /// [`Value::Listener`].
    Listener,
    /// [`Value::Object`].
    Object,
    /// [`Value::Template`].
    Template,
    /// [`Value::Conditional`].
    Conditional,
    /// [`Value::Repeat`].
    Repeat,
    /// [`Value::Component`].
    Component,
    /// [`Value::Spread`].
    Spread,
}

impl ValueKind {
    /// Returns `true` for kinds that own a region of child content.
    #[must_use]
    pub const fn is_directive(self) -> bool {
        matches!(
            self,
            Self::Template | Self::Conditional | Self::Repeat | Self::Component
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Listener => "listener",
            Self::Object => "object",
            Self::Template => "template",
            Self::Conditional => "conditional",
            Self::Repeat => "repeat",
            Self::Component => "component",
            Self::Spread => "spread",
        })
    }
}

impl Value {
    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Listener(_) => ValueKind::Listener,
            Self::Object(_) => ValueKind::Object,
            Self::Template(_) => ValueKind::Template,
            Self::Conditional(_) => ValueKind::Conditional,
            Self::Repeat(_) => ValueKind::Repeat,
            Self::Component(_) => ValueKind::Component,
            Self::Spread(_) => ValueKind::Spread,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Identity comparison used for dirty checking.
    ///
    /// Numbers compare by bit pattern except that every NaN equals every
    /// other NaN, so `0.0` and `-0.0` differ. Strings compare by content.
    /// Every other payload compares by pointer.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Listener(a), Self::Listener(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Self::Template(a), Self::Template(b)) => Rc::ptr_eq(a, b),
            (Self::Conditional(a), Self::Conditional(b)) => Rc::ptr_eq(a, b),
            (Self::Repeat(a), Self::Repeat(b)) => Rc::ptr_eq(a, b),
            (Self::Component(a), Self::Component(b)) => a.ptr_eq(b),
            (Self::Spread(a), Self::Spread(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Text form used by text, node and attribute bindings.
    ///
    /// Returns `None` for values that render nothing.
    #[must_use]
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Number(n) if n.is_infinite() => Some(Cow::Borrowed(if *n > 0.0 {
                "Infinity"
            } else {
                "-Infinity"
            })),
            Self::Number(n) => Some(Cow::Owned(format!("{n}"))),
            Self::String(s) => Some(Cow::Borrowed(&**s)),
            _ => None,
        }
    }

    /// Attribute form: `true` is an empty attribute, `false` and null remove it.
    #[must_use]
    pub fn to_attribute(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Bool(true) => Some(Cow::Borrowed("")),
            Self::Bool(false) => None,
            other => other.to_text(),
        }
    }

    /// Wraps an arbitrary object.
    pub fn object<T: Any>(value: T) -> Self {
        Self::Object(Rc::new(value))
    }

    /// Wraps an event listener.
    pub fn listener(f: impl Fn(&dyn Any) + 'static) -> Self {
        Self::Listener(Listener::new(f))
    }

    /// Renders `when_true` or `when_false` depending on `condition`.
    pub fn condition(
        condition: bool,
        when_true: impl Fn() -> Self + 'static,
        when_false: impl Fn() -> Self + 'static,
    ) -> Self {
        Self::Conditional(Rc::new(ConditionalValue::new(
            condition,
            Rc::new(when_true),
            Rc::new(when_false),
        )))
    }

    /// Renders `f` when `condition` holds, nothing otherwise.
    pub fn when(condition: bool, f: impl Fn() -> Self + 'static) -> Self {
        Self::condition(condition, f, || Self::Null)
    }

    /// Renders `f` unless `condition` holds.
    pub fn unless(condition: bool, f: impl Fn() -> Self + 'static) -> Self {
        Self::condition(condition, || Self::Null, f)
    }

    /// Renders a keyed list.
    pub fn repeat<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Key>,
        V: Into<Self>,
    {
        Self::Repeat(Rc::new(RepeatValue::keyed(items)))
    }

    /// Renders a component.
    pub fn component(component: impl Component) -> Self {
        Self::Component(ComponentElement::new(component))
    }

    /// Binds several named values onto one element.
    ///
    /// Names starting with `.` are properties, names starting with `@` are
    /// event listeners and everything else is an attribute.
    pub fn spread<N, V>(entries: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<Rc<str>>,
        V: Into<Self>,
    {
        Self::Spread(Rc::new(SpreadValue::new(entries)))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Listener(l) => fmt::Debug::fmt(l, f),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Template(t) => fmt::Debug::fmt(t, f),
            Self::Conditional(c) => fmt::Debug::fmt(c, f),
            Self::Repeat(r) => fmt::Debug::fmt(r, f),
            Self::Component(c) => fmt::Debug::fmt(c, f),
            Self::Spread(s) => fmt::Debug::fmt(s, f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Self::String(value)
    }
}

impl From<Listener> for Value {
    fn from(value: Listener) -> Self {
        Self::Listener(value)
    }
}

impl From<TemplateResult> for Value {
    fn from(value: TemplateResult) -> Self {
        Self::Template(Rc::new(value))
    }
}

impl From<ComponentElement> for Value {
    fn from(value: ComponentElement) -> Self {
        Self::Component(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A shared event callback.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&dyn Any)>);

impl Listener {
    /// Wraps a callback receiving the host's event payload.
    pub fn new(f: impl Fn(&dyn Any) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &dyn Any) {
        (self.0)(event);
    }

    /// Returns `true` if both handles share one callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// Lazily evaluated branch of a [`ConditionalValue`].
pub type Branch = Rc<dyn Fn() -> Value>;

/// Payload of [`Value::Conditional`].
///
/// Branches are only invoked when selected, and only once per branch
/// identity: binding a condition whose selected branch is the same `Rc` as
/// last time reuses the previous result.
pub struct ConditionalValue {
    condition: bool,
    when_true: Branch,
    when_false: Branch,
}

impl ConditionalValue {
    /// Creates a conditional from shared branches.
    #[must_use]
    pub fn new(condition: bool, when_true: Branch, when_false: Branch) -> Self {
        Self {
            condition,
            when_true,
            when_false,
        }
    }

    /// The selected side.
    #[must_use]
    pub fn condition(&self) -> bool {
        self.condition
    }

    /// The branch for `side`.
    #[must_use]
    pub fn branch(&self, side: bool) -> &Branch {
        if side { &self.when_true } else { &self.when_false }
    }
}

impl fmt::Debug for ConditionalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalValue")
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}

/// Identity of an item in a [`RepeatValue`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(Rc<str>),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<Rc<str>> for Key {
    fn from(value: Rc<str>) -> Self {
        Self::Str(value)
    }
}

/// Payload of [`Value::Repeat`]: an ordered list of keyed values.
#[derive(Debug, Default)]
pub struct RepeatValue {
    items: Vec<(Key, Value)>,
}

impl RepeatValue {
    /// Creates a list from key/value pairs.
    pub fn keyed<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        Self {
            items: items
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Creates a list keyed by position.
    pub fn indexed<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::keyed(items.into_iter().enumerate())
    }

    /// The items in order.
    #[must_use]
    pub fn items(&self) -> &[(Key, Value)] {
        &self.items
    }
}

/// Payload of [`Value::Spread`].
#[derive(Debug, Default)]
pub struct SpreadValue {
    entries: Vec<(Rc<str>, Value)>,
}

impl SpreadValue {
    /// Creates a spread from named values.
    pub fn new<N, V>(entries: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<Rc<str>>,
        V: Into<Value>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    /// The entries in order.
    #[must_use]
    pub fn entries(&self) -> &[(Rc<str>, Value)] {
        &self.entries
    }
}
